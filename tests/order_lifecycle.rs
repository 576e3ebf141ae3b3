use harvest_market_api::{
    dto::orders::{CreateOrderRequest, LineItemRequest, UpdateOrderStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
        products::Entity as Products,
    },
    error::AppError,
    services::order_service,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

mod common;

#[tokio::test]
async fn order_total_matches_line_items() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let cheap = common::create_approved_product(&state, farmer_id, 1_500, 20).await?;
    let dear = common::create_approved_product(&state, farmer_id, 8_000, 20).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let resp = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![
                LineItemRequest {
                    product_id: cheap,
                    quantity: 3,
                },
                LineItemRequest {
                    product_id: dear,
                    quantity: 2,
                },
            ],
            pickup_details: None,
        },
    )
    .await?;

    let placed = resp.data.unwrap();
    let expected: i64 = 3 * 1_500 + 2 * 8_000;
    assert_eq!(placed.order.total_amount, expected);

    let stored: i64 = placed
        .items
        .iter()
        .map(|item| item.unit_price * item.quantity as i64)
        .sum();
    assert_eq!(stored, expected);

    Ok(())
}

#[tokio::test]
async fn oversized_order_fails_and_leaves_stock_alone() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 2_000, 3).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let err = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![LineItemRequest {
                product_id,
                quantity: 5,
            }],
            pickup_details: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 3, "failed order must not touch stock");

    Ok(())
}

#[tokio::test]
async fn multi_item_order_aborts_whole_checkout_on_one_bad_item() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let plenty = common::create_approved_product(&state, farmer_id, 1_000, 50).await?;
    let scarce = common::create_approved_product(&state, farmer_id, 1_000, 1).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let err = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![
                LineItemRequest {
                    product_id: plenty,
                    quantity: 10,
                },
                LineItemRequest {
                    product_id: scarce,
                    quantity: 2,
                },
            ],
            pickup_details: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock(_)));

    // No partial decrement on the item that would have fit.
    let product = Products::find_by_id(plenty).one(&state.orm).await?.unwrap();
    assert_eq!(product.stock, 50);

    Ok(())
}

#[tokio::test]
async fn cancel_restores_stock_exactly() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 2_000, 7).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let staff = common::actor(staff_id, "staff");

    let resp = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![LineItemRequest {
                product_id,
                quantity: 4,
            }],
            pickup_details: None,
        },
    )
    .await?;
    let order_id = resp.data.unwrap().order.id;

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 3);

    // Cancel from processing, a stock-holding state.
    order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?;
    let resp = order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "canceled".into(),
        },
    )
    .await?;
    assert_eq!(resp.data.unwrap().status, "canceled");

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 7, "cancel must return every unit");

    Ok(())
}

#[tokio::test]
async fn completed_order_rejects_reversion() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
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

    for status in ["processing", "ready", "completed"] {
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

    let err = order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "pending".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // Completed is terminal for cancellation too.
    let err = order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "canceled".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    Ok(())
}

#[tokio::test]
async fn reapplying_current_status_is_a_quiet_success() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 2_000, 5).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let staff = common::actor(staff_id, "staff");

    let resp = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![LineItemRequest {
                product_id,
                quantity: 2,
            }],
            pickup_details: None,
        },
    )
    .await?;
    let order_id = resp.data.unwrap().order.id;

    order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?;
    let resp = order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?;
    assert_eq!(resp.message, "Order unchanged");
    assert_eq!(resp.data.unwrap().status, "processing");

    Ok(())
}

#[tokio::test]
async fn delete_is_pending_only_and_cascades_items() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let staff_id = common::create_user(&state, "staff").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 2_000, 9).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let staff = common::actor(staff_id, "staff");

    let resp = order_service::create_order(
        &state,
        &consumer,
        CreateOrderRequest {
            line_items: vec![LineItemRequest {
                product_id,
                quantity: 3,
            }],
            pickup_details: None,
        },
    )
    .await?;
    let pending_id = resp.data.unwrap().order.id;

    order_service::delete_order(&state, &consumer, pending_id).await?;
    assert!(Orders::find_by_id(pending_id).one(&state.orm).await?.is_none());
    let leftover = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(pending_id))
        .all(&state.orm)
        .await?;
    assert!(leftover.is_empty(), "line items must go with the order");

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 9);

    // Once processing, deletion is refused.
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
    order_service::transition_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?;

    let err = order_service::delete_order(&state, &staff, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}
