use harvest_market_api::{
    dto::orders::{CreateOrderRequest, LineItemRequest},
    dto::pickups::{AssignDriverRequest, CreatePickupRequest},
    error::AppError,
    services::{order_service, pickup_service},
};
use sea_orm::EntityTrait;

use harvest_market_api::entity::products::Entity as Products;

mod common;

// Two buyers race for the last unit; the row lock decides and exactly one wins.
#[tokio::test]
async fn last_unit_goes_to_exactly_one_buyer() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let buyer_a = common::create_user(&state, "consumer").await?;
    let buyer_b = common::create_user(&state, "consumer").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 4_000, 1).await?;

    let request = || CreateOrderRequest {
        line_items: vec![LineItemRequest {
            product_id,
            quantity: 1,
        }],
        pickup_details: None,
    };

    let actor_a = common::actor(buyer_a, "consumer");
    let actor_b = common::actor(buyer_b, "consumer");
    let (first, second) = tokio::join!(
        order_service::create_order(&state, &actor_a, request()),
        order_service::create_order(&state, &actor_b, request()),
    );

    let outcomes = [first, second];
    let wins = outcomes.iter().filter(|result| result.is_ok()).count();
    assert_eq!(wins, 1, "exactly one order may claim the last unit");
    let loser = outcomes
        .iter()
        .find(|result| result.is_err())
        .unwrap()
        .as_ref()
        .unwrap_err();
    assert!(matches!(loser, AppError::InsufficientStock(_)));

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 0);

    Ok(())
}

// Two pickups race for one available driver; the claim check under the
// driver's row lock lets at most one through.
#[tokio::test]
async fn driver_is_claimed_by_at_most_one_pickup() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
    let driver_id = common::create_driver(&state, "available").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 2_000, 10).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let staff = common::actor(staff_id, "staff");

    let mut pickup_ids = Vec::new();
    for _ in 0..2 {
        let resp = order_service::create_order(
            &state,
            &consumer,
            CreateOrderRequest {
                line_items: vec![LineItemRequest {
                    product_id,
                    quantity: 1,
                }],
                pickup_details: None,
            },
        )
        .await?;
        let order_id = resp.data.unwrap().order.id;

        let resp = pickup_service::create_pickup(
            &state,
            &staff,
            CreatePickupRequest {
                order_id,
                pickup_location: "Terminal".into(),
                pickup_date: None,
                notes: None,
            },
        )
        .await?;
        pickup_ids.push(resp.data.unwrap().id);
    }

    let (first, second) = tokio::join!(
        pickup_service::assign_driver(
            &state,
            &staff,
            pickup_ids[0],
            AssignDriverRequest { driver_id },
        ),
        pickup_service::assign_driver(
            &state,
            &staff,
            pickup_ids[1],
            AssignDriverRequest { driver_id },
        ),
    );

    let outcomes = [first, second];
    let wins = outcomes.iter().filter(|result| result.is_ok()).count();
    assert_eq!(wins, 1, "only one pickup may claim the driver");
    let loser = outcomes
        .iter()
        .find(|result| result.is_err())
        .unwrap()
        .as_ref()
        .unwrap_err();
    assert!(matches!(loser, AppError::Conflict(_)));

    Ok(())
}

// A busy driver is never assignable, concurrent or not.
#[tokio::test]
async fn busy_driver_rejects_assignment() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
    let driver_id = common::create_driver(&state, "busy").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 2_000, 5).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let staff = common::actor(staff_id, "staff");

    let resp = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![LineItemRequest {
                product_id,
                quantity: 1,
            }],
            pickup_details: None,
        },
    )
    .await?;
    let order_id = resp.data.unwrap().order.id;

    let resp = pickup_service::create_pickup(
        &state,
        &staff,
        CreatePickupRequest {
            order_id,
            pickup_location: "Terminal".into(),
            pickup_date: None,
            notes: None,
        },
    )
    .await?;
    let pickup_id = resp.data.unwrap().id;

    let err = pickup_service::assign_driver(
        &state,
        &staff,
        pickup_id,
        AssignDriverRequest { driver_id },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}
