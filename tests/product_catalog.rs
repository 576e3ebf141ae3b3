use harvest_market_api::{
    dto::orders::{CreateOrderRequest, LineItemRequest},
    dto::products::{CreateProductRequest, SetCategoriesRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::Entity as Orders,
        product_categories::{Column as ProductCategoryCol, Entity as ProductCategories},
        products::Entity as Products,
    },
    error::AppError,
    services::{order_service, product_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

mod common;

#[tokio::test]
async fn deleting_a_product_nullifies_history_and_drops_mappings() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let consumer_id = common::create_user(&state, "consumer").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 3_000, 10).await?;

    let consumer = common::actor(consumer_id, "consumer");
    let farmer = common::actor(farmer_id, "farmer");

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
    let placed = resp.data.unwrap();
    let order_id = placed.order.id;
    let total_before = placed.order.total_amount;

    product_service::delete_product(&state, &farmer, product_id).await?;

    assert!(
        Products::find_by_id(product_id)
            .one(&state.orm)
            .await?
            .is_none()
    );

    let mappings = ProductCategories::find()
        .filter(ProductCategoryCol::ProductId.eq(product_id))
        .count(&state.orm)
        .await?;
    assert_eq!(mappings, 0, "category mappings are removed outright");

    // History survives with the reference nullified: same row count, same total.
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(&state.orm)
        .await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, None);
    let recomputed: i64 = items
        .iter()
        .map(|item| item.unit_price * item.quantity as i64)
        .sum();
    assert_eq!(recomputed, total_before);

    let order = Orders::find_by_id(order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.total_amount, total_before);

    Ok(())
}

#[tokio::test]
async fn category_set_can_be_replaced_but_never_emptied() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let farmer_id = common::create_user(&state, "farmer").await?;
    let product_id = common::create_approved_product(&state, farmer_id, 3_000, 10).await?;
    let farmer = common::actor(farmer_id, "farmer");

    let err = product_service::set_categories(
        &state,
        &farmer,
        product_id,
        SetCategoriesRequest {
            category_ids: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let replacement_a = common::create_category(&state).await?;
    let replacement_b = common::create_category(&state).await?;
    product_service::set_categories(
        &state,
        &farmer,
        product_id,
        SetCategoriesRequest {
            category_ids: vec![replacement_a, replacement_b],
        },
    )
    .await?;

    let mapped: Vec<i64> = ProductCategories::find()
        .filter(ProductCategoryCol::ProductId.eq(product_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|mapping| mapping.category_id)
        .collect();
    assert_eq!(mapped.len(), 2);
    assert!(mapped.contains(&replacement_a) && mapped.contains(&replacement_b));

    Ok(())
}

#[tokio::test]
async fn listings_need_a_farmer_and_a_category() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let consumer_id = common::create_user(&state, "consumer").await?;
    let farmer_id = common::create_user(&state, "farmer").await?;
    let category_id = common::create_category(&state).await?;

    // A consumer is not a registered seller.
    let err = product_service::create_product(
        &state,
        &common::actor(consumer_id, "consumer"),
        CreateProductRequest {
            name: "Calamansi".into(),
            description: None,
            price: 2_500,
            stock: 30,
            unit_type: "kg".into(),
            image_url: None,
            category_ids: vec![category_id],
            area_ids: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // No categories, no listing.
    let err = product_service::create_product(
        &state,
        &common::actor(farmer_id, "farmer"),
        CreateProductRequest {
            name: "Calamansi".into(),
            description: None,
            price: 2_500,
            stock: 30,
            unit_type: "kg".into(),
            image_url: None,
            category_ids: vec![],
            area_ids: vec![],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The well-formed listing lands as pending until staff approve it.
    let resp = product_service::create_product(
        &state,
        &common::actor(farmer_id, "farmer"),
        CreateProductRequest {
            name: "Calamansi".into(),
            description: Some("Sour and bright".into()),
            price: 2_500,
            stock: 30,
            unit_type: "kg".into(),
            image_url: None,
            category_ids: vec![category_id],
            area_ids: vec![],
        },
    )
    .await?;
    let product = resp.data.unwrap();
    assert_eq!(product.status, "pending");

    Ok(())
}
