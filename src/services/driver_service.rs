use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    domain::status::{DriverAvailability, next_rating},
    dto::drivers::{
        DriverList, RecordCompletionRequest, RegisterDriverRequest, UpdateAvailabilityRequest,
        UpdateDriverProfileRequest,
    },
    entity::{
        drivers::{
            ActiveModel as DriverActive, Column as DriverCol, Entity as Drivers,
            Model as DriverModel,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{Actor, ensure_staff},
    models::Driver,
    response::{ApiResponse, Meta},
    routes::params::DriverListQuery,
    state::AppState,
};

/// Create the driver profile next to an existing user account with the
/// driver role. Drivers start offline until they report in.
pub async fn register_driver(
    state: &AppState,
    actor: &Actor,
    payload: RegisterDriverRequest,
) -> AppResult<ApiResponse<Driver>> {
    ensure_staff(actor)?;

    if payload.max_load_capacity <= 0 {
        return Err(AppError::Validation(
            "max_load_capacity must be positive".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let user = Users::find_by_id(payload.user_id)
        .filter(UserCol::Role.eq("driver"))
        .one(&txn)
        .await?;
    if user.is_none() {
        return Err(AppError::Validation(format!(
            "User {} does not exist with the driver role",
            payload.user_id
        )));
    }

    if Drivers::find_by_id(payload.user_id).one(&txn).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Driver {} is already registered",
            payload.user_id
        )));
    }

    let driver = DriverActive {
        user_id: Set(payload.user_id),
        availability_status: Set(DriverAvailability::Offline.as_str().into()),
        vehicle_type: Set(payload.vehicle_type),
        max_load_capacity: Set(payload.max_load_capacity),
        current_location: Set(None),
        completed_pickups: Set(0),
        rating: Set(0.0),
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "driver_register",
        Some("drivers"),
        Some(serde_json::json!({ "driver_id": driver.user_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Driver registered",
        driver_from_entity(driver),
        Some(Meta::empty()),
    ))
}

/// Availability is self-reported and unconditional: no rule ties it to live
/// pickup assignments (dispatch policy owns that), so a driver may go
/// `available` while still assigned. Bad values are rejected up front.
pub async fn update_availability(
    state: &AppState,
    actor: &Actor,
    driver_id: i64,
    payload: UpdateAvailabilityRequest,
) -> AppResult<ApiResponse<Driver>> {
    if actor.role != "staff" && actor.user_id != driver_id {
        return Err(AppError::Forbidden);
    }
    let status: DriverAvailability = payload.status.parse()?;

    let driver = Drivers::find_by_id(driver_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: DriverActive = driver.into();
    active.availability_status = Set(status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let driver = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "driver_availability_update",
        Some("drivers"),
        Some(serde_json::json!({ "driver_id": driver_id, "status": status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Availability updated",
        driver_from_entity(driver),
        Some(Meta::empty()),
    ))
}

/// Fold one completed pickup into the driver's counters. When a rating comes
/// with it, the stored rating is recomputed from the PRE-increment count:
/// an average of averages, preserved exactly for report compatibility.
pub async fn apply_completion<C: ConnectionTrait>(
    conn: &C,
    driver_id: i64,
    rating: Option<f64>,
) -> AppResult<DriverModel> {
    if let Some(score) = rating {
        if !(1.0..=5.0).contains(&score) {
            return Err(AppError::Validation(format!(
                "Rating {score} out of range 1..=5"
            )));
        }
    }

    let driver = Drivers::find_by_id(driver_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let old_count = driver.completed_pickups;
    let new_rating = match rating {
        Some(score) => next_rating(driver.rating, old_count, score),
        None => driver.rating,
    };

    let mut active: DriverActive = driver.into();
    active.completed_pickups = Set(old_count + 1);
    active.rating = Set(new_rating);
    active.updated_at = Set(Utc::now().into());
    let driver = active.update(conn).await?;

    Ok(driver)
}

/// Staff-facing wrapper around [`apply_completion`] for completions recorded
/// outside the pickup workflow (manual corrections, phoned-in deliveries).
pub async fn record_completion(
    state: &AppState,
    actor: &Actor,
    driver_id: i64,
    payload: RecordCompletionRequest,
) -> AppResult<ApiResponse<Driver>> {
    ensure_staff(actor)?;

    let txn = state.orm.begin().await?;
    let driver = apply_completion(&txn, driver_id, payload.rating).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "driver_completion_record",
        Some("drivers"),
        Some(serde_json::json!({
            "driver_id": driver_id,
            "completed_pickups": driver.completed_pickups,
            "rating": payload.rating,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Completion recorded",
        driver_from_entity(driver),
        Some(Meta::empty()),
    ))
}

/// Profile fields drivers may change about themselves. The set is a fixed
/// allow-list; there is no generic field/value update path.
pub async fn update_profile(
    state: &AppState,
    actor: &Actor,
    driver_id: i64,
    payload: UpdateDriverProfileRequest,
) -> AppResult<ApiResponse<Driver>> {
    if actor.role != "staff" && actor.user_id != driver_id {
        return Err(AppError::Forbidden);
    }
    if let Some(capacity) = payload.max_load_capacity {
        if capacity <= 0 {
            return Err(AppError::Validation(
                "max_load_capacity must be positive".into(),
            ));
        }
    }

    let driver = Drivers::find_by_id(driver_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: DriverActive = driver.into();
    if let Some(vehicle_type) = payload.vehicle_type {
        active.vehicle_type = Set(vehicle_type);
    }
    if let Some(capacity) = payload.max_load_capacity {
        active.max_load_capacity = Set(capacity);
    }
    if let Some(location) = payload.current_location {
        active.current_location = Set(Some(location));
    }
    active.updated_at = Set(Utc::now().into());
    let driver = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Driver updated",
        driver_from_entity(driver),
        Some(Meta::empty()),
    ))
}

pub async fn get_driver(state: &AppState, id: i64) -> AppResult<ApiResponse<Driver>> {
    let driver = Drivers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Driver",
        driver_from_entity(driver),
        None,
    ))
}

pub async fn list_drivers(
    state: &AppState,
    query: DriverListQuery,
) -> AppResult<ApiResponse<DriverList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(availability) = query.availability.as_ref().filter(|s| !s.is_empty()) {
        let availability: DriverAvailability = availability.parse()?;
        condition = condition.add(DriverCol::AvailabilityStatus.eq(availability.as_str()));
    }

    let finder = Drivers::find()
        .filter(condition)
        .order_by_desc(DriverCol::Rating)
        .order_by_asc(DriverCol::UserId);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(driver_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Drivers",
        DriverList { items },
        Some(meta),
    ))
}

fn driver_from_entity(model: DriverModel) -> Driver {
    Driver {
        user_id: model.user_id,
        availability_status: model.availability_status,
        vehicle_type: model.vehicle_type,
        max_load_capacity: model.max_load_capacity,
        current_location: model.current_location,
        completed_pickups: model.completed_pickups,
        rating: model.rating,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
