use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    domain::status::{OrderStatus, Transition, validate_order_transition},
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::Entity as Products,
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::Actor,
    models::{Order, OrderItem},
    notify,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service,
    state::AppState,
};

/// Checkout. Validates the consumer and every line item, snapshots prices,
/// and decrements stock, all inside a single transaction. Any failure aborts
/// the whole order; partial inserts are never visible.
pub async fn create_order(
    state: &AppState,
    actor: &Actor,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.line_items.is_empty() {
        return Err(AppError::Validation("Order has no line items".into()));
    }
    for item in &payload.line_items {
        if item.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "Quantity for product {} must be positive",
                item.product_id
            )));
        }
    }

    // Lock products in id order so concurrent multi-item orders cannot
    // deadlock against each other.
    let mut line_items = payload.line_items;
    line_items.sort_by_key(|item| item.product_id);
    if line_items.windows(2).any(|w| w[0].product_id == w[1].product_id) {
        return Err(AppError::Validation(
            "Duplicate product in line items".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let consumer = Users::find_by_id(actor.user_id)
        .filter(UserCol::Role.eq("consumer"))
        .one(&txn)
        .await?;
    if consumer.is_none() {
        return Err(AppError::Validation(format!(
            "Unknown consumer {}",
            actor.user_id
        )));
    }

    let mut priced: Vec<(i64, i32, i64)> = Vec::with_capacity(line_items.len());
    let mut total_amount: i64 = 0;
    for item in &line_items {
        let product = Products::find_by_id(item.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Unknown product {}", item.product_id))
            })?;

        if product.status != "approved" {
            return Err(AppError::Validation(format!(
                "Product {} is not open for orders",
                product.id
            )));
        }
        if product.stock < item.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Product {} has {} {} left, {} requested",
                product.id, product.stock, product.unit_type, item.quantity
            )));
        }

        total_amount += product.price * (item.quantity as i64);
        priced.push((product.id, item.quantity, product.price));
    }

    let order = OrderActive {
        id: NotSet,
        consumer_id: Set(actor.user_id),
        status: Set(OrderStatus::Pending.as_str().into()),
        total_amount: Set(total_amount),
        pickup_details: Set(payload.pickup_details),
        order_date: NotSet,
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(priced.len());
    for (product_id, quantity, unit_price) in &priced {
        let item = OrderItemActive {
            id: NotSet,
            order_id: Set(order.id),
            product_id: Set(Some(*product_id)),
            quantity: Set(*quantity),
            unit_price: Set(*unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));

        product_service::decrement_stock(&txn, *product_id, *quantity).await?;
    }

    txn.commit().await?;

    notify::dispatch_quietly(
        &state.pool,
        actor.user_id,
        &format!("Order #{} placed, awaiting processing", order.id),
        "order_placed",
        Some(order.id),
    )
    .await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Move an order along its lifecycle. Re-applying the current status is a
/// no-op success. Cancelling an order that still holds stock gives the stock
/// back in the same transaction.
pub async fn transition_status(
    state: &AppState,
    actor: &Actor,
    id: i64,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next: OrderStatus = payload.status.parse()?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Consumers may only cancel their own order; anything else is staff work.
    if actor.role != "staff"
        && !(order.consumer_id == actor.user_id && next == OrderStatus::Canceled)
    {
        return Err(AppError::Forbidden);
    }

    let current: OrderStatus = order.status.parse()?;
    if let Transition::Noop = validate_order_transition(current, next)? {
        return Ok(ApiResponse::success(
            "Order unchanged",
            order_from_entity(order),
            Some(Meta::empty()),
        ));
    }

    if next == OrderStatus::Canceled && current.holds_stock() {
        restore_stock_for_order(&txn, order.id).await?;
    }

    let consumer_id = order.consumer_id;
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    notify::dispatch_quietly(
        &state.pool,
        consumer_id,
        &format!("Order #{} is now {}", order.id, next),
        "order_status",
        Some(order.id),
    )
    .await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "from": current.as_str(),
            "to": next.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Remove an order that never entered fulfillment. Line items go with it;
/// anything past `pending` is history and refuses deletion.
pub async fn delete_order(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if actor.role != "staff" && order.consumer_id != actor.user_id {
        return Err(AppError::Forbidden);
    }

    if order.status != OrderStatus::Pending.as_str() {
        return Err(AppError::Conflict(format!(
            "Order #{} is {} and can no longer be deleted",
            order.id, order.status
        )));
    }

    restore_stock_for_order(&txn, order.id).await?;

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(order.id).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if actor.role != "staff" && order.consumer_id != actor.user_id {
        return Err(AppError::Forbidden);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Filtering-only read surface: consumers see their own orders, staff see
/// everything, optionally narrowed by status and order-date range.
pub async fn list_orders(
    state: &AppState,
    actor: &Actor,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if actor.role != "staff" {
        condition = condition.add(OrderCol::ConsumerId.eq(actor.user_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(from) = query.date_from {
        condition = condition.add(OrderCol::OrderDate.gte(from));
    }
    if let Some(to) = query.date_to {
        condition = condition.add(OrderCol::OrderDate.lte(to));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::OrderDate),
        SortOrder::Desc => finder.order_by_desc(OrderCol::OrderDate),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Give back the stock an order took at checkout. Items whose product has
/// since been deleted carry a nullified reference and are skipped.
async fn restore_stock_for_order(
    txn: &sea_orm::DatabaseTransaction,
    order_id: i64,
) -> AppResult<()> {
    let items: Vec<OrderItemModel> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;

    for item in items {
        if let Some(product_id) = item.product_id {
            product_service::restore_stock(txn, product_id, item.quantity).await?;
        }
    }

    Ok(())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        consumer_id: model.consumer_id,
        status: model.status,
        total_amount: model.total_amount,
        pickup_details: model.pickup_details,
        order_date: model.order_date.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
