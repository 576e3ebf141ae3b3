use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    domain::status::{DriverAvailability, PickupStatus, Transition, validate_pickup_transition},
    dto::pickups::{
        AssignDriverRequest, CreatePickupRequest, PickupList, UpdatePickupStatusRequest,
    },
    entity::{
        drivers::Entity as Drivers,
        orders::Entity as Orders,
        pickups::{
            ActiveModel as PickupActive, Column as PickupCol, Entity as Pickups,
            Model as PickupModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{Actor, ensure_staff},
    models::Pickup,
    notify,
    response::{ApiResponse, Meta},
    routes::params::PickupListQuery,
    services::driver_service,
    state::AppState,
};

/// Pickup statuses that still tie up the assigned driver.
const PICKUP_ACTIVE_STATUSES: [&str; 4] = ["assigned", "scheduled", "in_transit", "picked_up"];

/// Open a pickup record for an order that needs physical handoff. Each order
/// carries at most one pickup.
pub async fn create_pickup(
    state: &AppState,
    actor: &Actor,
    payload: CreatePickupRequest,
) -> AppResult<ApiResponse<Pickup>> {
    ensure_staff(actor)?;

    if payload.pickup_location.trim().is_empty() {
        return Err(AppError::Validation("pickup_location is required".into()));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id).one(&txn).await?;
    if order.is_none() {
        return Err(AppError::Conflict(format!(
            "Order #{} does not exist",
            payload.order_id
        )));
    }

    let existing = Pickups::find()
        .filter(PickupCol::OrderId.eq(payload.order_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Order #{} already has a pickup",
            payload.order_id
        )));
    }

    let pickup = PickupActive {
        id: NotSet,
        order_id: Set(payload.order_id),
        status: Set(PickupStatus::Pending.as_str().into()),
        pickup_date: Set(payload.pickup_date.map(Into::into)),
        pickup_location: Set(payload.pickup_location),
        assigned_to: Set(None),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "pickup_create",
        Some("pickups"),
        Some(serde_json::json!({ "pickup_id": pickup.id, "order_id": pickup.order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Pickup created",
        pickup_from_entity(pickup),
        Some(Meta::empty()),
    ))
}

/// Attach a driver to a pickup. The driver row is re-read under a row lock in
/// the same transaction that writes `assigned_to`, so two pickups racing for
/// the same driver cannot both win. Assignment does not flip the driver's
/// availability; that belongs to the dispatch policy outside this core.
pub async fn assign_driver(
    state: &AppState,
    actor: &Actor,
    pickup_id: i64,
    payload: AssignDriverRequest,
) -> AppResult<ApiResponse<Pickup>> {
    ensure_staff(actor)?;

    let txn = state.orm.begin().await?;

    let pickup = Pickups::find_by_id(pickup_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let driver = Drivers::find_by_id(payload.driver_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let driver = match driver {
        Some(d) => d,
        None => {
            return Err(AppError::Conflict(format!(
                "Driver {} is not registered",
                payload.driver_id
            )));
        }
    };

    if driver.availability_status != DriverAvailability::Available.as_str() {
        return Err(AppError::Conflict(format!(
            "Driver {} is {}, not available",
            driver.user_id, driver.availability_status
        )));
    }

    // The driver row is locked above, so two assignments racing for the same
    // driver serialize here and the loser sees the winner's claim.
    let claimed = Pickups::find()
        .filter(PickupCol::AssignedTo.eq(driver.user_id))
        .filter(PickupCol::Status.is_in(PICKUP_ACTIVE_STATUSES))
        .one(&txn)
        .await?;
    if let Some(other) = claimed {
        return Err(AppError::Conflict(format!(
            "Driver {} is already claimed by pickup #{}",
            driver.user_id, other.id
        )));
    }

    let mut active: PickupActive = pickup.into();
    active.assigned_to = Set(Some(driver.user_id));
    active.status = Set(PickupStatus::Assigned.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let pickup = active.update(&txn).await?;

    txn.commit().await?;

    notify::dispatch_quietly(
        &state.pool,
        driver.user_id,
        &format!("You have been assigned pickup #{}", pickup.id),
        "pickup_assigned",
        Some(pickup.id),
    )
    .await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "pickup_assign",
        Some("pickups"),
        Some(serde_json::json!({ "pickup_id": pickup.id, "driver_id": driver.user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Driver assigned",
        pickup_from_entity(pickup),
        Some(Meta::empty()),
    ))
}

/// Set a pickup's status. The transition policy is a deliberately permissive
/// allow-list (see `domain::status`); completing a pickup also credits the
/// assigned driver's completion counter in the same transaction.
pub async fn transition_status(
    state: &AppState,
    actor: &Actor,
    pickup_id: i64,
    payload: UpdatePickupStatusRequest,
) -> AppResult<ApiResponse<Pickup>> {
    let next: PickupStatus = payload.status.parse()?;

    let txn = state.orm.begin().await?;

    let pickup = Pickups::find_by_id(pickup_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    // Staff manage any pickup; a driver only touches the one assigned to them.
    if actor.role != "staff"
        && !(actor.role == "driver" && pickup.assigned_to == Some(actor.user_id))
    {
        return Err(AppError::Forbidden);
    }

    let current: PickupStatus = pickup.status.parse()?;
    if let Transition::Noop = validate_pickup_transition(current, next)? {
        return Ok(ApiResponse::success(
            "Pickup unchanged",
            pickup_from_entity(pickup),
            Some(Meta::empty()),
        ));
    }

    if next == PickupStatus::Completed {
        if let Some(driver_id) = pickup.assigned_to {
            driver_service::apply_completion(&txn, driver_id, None).await?;
        }
    }

    let order_id = pickup.order_id;
    let mut active: PickupActive = pickup.into();
    active.status = Set(next.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let pickup = active.update(&txn).await?;

    let consumer_id = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .map(|order| order.consumer_id);

    txn.commit().await?;

    if let Some(consumer_id) = consumer_id {
        notify::dispatch_quietly(
            &state.pool,
            consumer_id,
            &format!("Pickup for order #{} is now {}", order_id, next),
            "pickup_status",
            Some(pickup.id),
        )
        .await;
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "pickup_status_update",
        Some("pickups"),
        Some(serde_json::json!({
            "pickup_id": pickup.id,
            "from": current.as_str(),
            "to": next.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Pickup updated",
        pickup_from_entity(pickup),
        Some(Meta::empty()),
    ))
}

/// Pickups that have left `pending` are operational history; removing one
/// takes an explicit staff override.
pub async fn delete_pickup(
    state: &AppState,
    actor: &Actor,
    pickup_id: i64,
    force: bool,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(actor)?;

    let txn = state.orm.begin().await?;

    let pickup = Pickups::find_by_id(pickup_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if pickup.status != PickupStatus::Pending.as_str() && !force {
        return Err(AppError::Conflict(format!(
            "Pickup #{} is {}; pass force=true to delete it anyway",
            pickup.id, pickup.status
        )));
    }

    Pickups::delete_by_id(pickup.id).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "pickup_delete",
        Some("pickups"),
        Some(serde_json::json!({ "pickup_id": pickup_id, "force": force })),
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

pub async fn get_pickup(state: &AppState, id: i64) -> AppResult<ApiResponse<Pickup>> {
    let pickup = Pickups::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Pickup",
        pickup_from_entity(pickup),
        None,
    ))
}

pub async fn list_pickups(
    state: &AppState,
    query: PickupListQuery,
) -> AppResult<ApiResponse<PickupList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: PickupStatus = status.parse()?;
        condition = condition.add(PickupCol::Status.eq(status.as_str()));
    }
    if let Some(driver_id) = query.driver_id {
        condition = condition.add(PickupCol::AssignedTo.eq(driver_id));
    }

    let finder = Pickups::find()
        .filter(condition)
        .order_by_desc(PickupCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(pickup_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Pickups",
        PickupList { items },
        Some(meta),
    ))
}

fn pickup_from_entity(model: PickupModel) -> Pickup {
    Pickup {
        id: model.id,
        order_id: model.order_id,
        status: model.status,
        pickup_date: model.pickup_date.map(|dt| dt.with_timezone(&Utc)),
        pickup_location: model.pickup_location,
        assigned_to: model.assigned_to,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
