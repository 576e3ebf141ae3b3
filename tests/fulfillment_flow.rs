use harvest_market_api::{
    dto::drivers::RecordCompletionRequest,
    dto::orders::{CreateOrderRequest, LineItemRequest, UpdateOrderStatusRequest},
    dto::pickups::{AssignDriverRequest, CreatePickupRequest, UpdatePickupStatusRequest},
    entity::{drivers::Entity as Drivers, products::Entity as Products},
    services::{driver_service, order_service, pickup_service},
};
use sea_orm::EntityTrait;

mod common;

// Integration flow: consumer orders, staff move the order and pickup through
// their lifecycles, the assigned driver gets completion credit.
#[tokio::test]
async fn order_pickup_and_driver_completion_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 5_000, 10).await?;
    let driver_id = common::create_driver(&state, "available").await?;

    let consumer = common::actor(consumer_id, "consumer");
    let staff = common::actor(staff_id, "staff");
    let driver = common::actor(driver_id, "driver");

    // Checkout: 2 kg at 5000 -> total 10000, stock 10 -> 8.
    let resp = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![LineItemRequest {
                product_id,
                quantity: 2,
            }],
            pickup_details: Some("Market stall 4".into()),
        },
    )
    .await?;
    let placed = resp.data.unwrap();
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.total_amount, 10_000);
    assert_eq!(placed.items.len(), 1);

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 8);

    let order_id = placed.order.id;

    // Staff start processing.
    let resp = order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?;
    assert_eq!(resp.data.unwrap().status, "processing");

    // Pickup is opened and a driver assigned.
    let resp = pickup_service::create_pickup(
        &state,
        &staff,
        CreatePickupRequest {
            order_id,
            pickup_location: "Barangay hall".into(),
            pickup_date: None,
            notes: None,
        },
    )
    .await?;
    let pickup_id = resp.data.unwrap().id;

    let resp = pickup_service::assign_driver(
        &state,
        &staff,
        pickup_id,
        AssignDriverRequest { driver_id },
    )
    .await?;
    let assigned = resp.data.unwrap();
    assert_eq!(assigned.status, "assigned");
    assert_eq!(assigned.assigned_to, Some(driver_id));

    // The driver runs the route and completes.
    for status in ["in_transit", "picked_up", "completed"] {
        pickup_service::transition_status(
            &state,
            &driver,
            pickup_id,
            UpdatePickupStatusRequest {
                status: status.into(),
            },
        )
        .await?;
    }

    let driver_row = Drivers::find_by_id(driver_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(driver_row.completed_pickups, 1);
    assert_eq!(driver_row.rating, 0.0);

    // A staff-recorded rated completion folds with the pre-increment count:
    // (0.0 * 1 + 4.0) / 2 = 2.0.
    let resp = driver_service::record_completion(
        &state,
        &staff,
        driver_id,
        RecordCompletionRequest { rating: Some(4.0) },
    )
    .await?;
    let driver_row = resp.data.unwrap();
    assert_eq!(driver_row.completed_pickups, 2);
    assert!((driver_row.rating - 2.0).abs() < f64::EPSILON);

    // Order finishes its own lifecycle independently of the pickup.
    for status in ["ready", "completed"] {
        order_service::transition_status(
            &state,
            &staff,
            order_id,
            UpdateOrderStatusRequest {
                status: status.into(),
            },
        )
        .await?;
    }

    let resp = order_service::get_order(&state, &staff, order_id).await?;
    assert_eq!(resp.data.unwrap().order.status, "completed");

    Ok(())
}
