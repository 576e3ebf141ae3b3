use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};

use crate::{
    dto::drivers::{
        DriverList, RecordCompletionRequest, RegisterDriverRequest, UpdateAvailabilityRequest,
        UpdateDriverProfileRequest,
    },
    error::AppResult,
    middleware::auth::Actor,
    models::Driver,
    response::ApiResponse,
    routes::params::DriverListQuery,
    services::driver_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_driver))
        .route("/", get(list_drivers))
        .route("/{id}", get(get_driver))
        .route("/{id}", patch(update_profile))
        .route("/{id}/availability", patch(update_availability))
        .route("/{id}/completions", post(record_completion))
}

#[utoipa::path(
    post,
    path = "/api/drivers",
    request_body = RegisterDriverRequest,
    responses(
        (status = 200, description = "Driver registered", body = ApiResponse<Driver>),
        (status = 409, description = "Already registered"),
        (status = 403, description = "Forbidden"),
    ),
    tag = "Drivers"
)]
pub async fn register_driver(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<RegisterDriverRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::register_driver(&state, &actor, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/drivers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("availability" = Option<String>, Query, description = "Filter: available, busy, offline"),
    ),
    responses(
        (status = 200, description = "List drivers", body = ApiResponse<DriverList>)
    ),
    tag = "Drivers"
)]
pub async fn list_drivers(
    State(state): State<AppState>,
    Query(query): Query<DriverListQuery>,
) -> AppResult<Json<ApiResponse<DriverList>>> {
    let resp = driver_service::list_drivers(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    params(("id" = i64, Path, description = "Driver user ID")),
    responses(
        (status = 200, description = "Driver", body = ApiResponse<Driver>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Drivers"
)]
pub async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::get_driver(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/drivers/{id}/availability",
    params(("id" = i64, Path, description = "Driver user ID")),
    request_body = UpdateAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<Driver>),
        (status = 400, description = "Unknown availability status"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Drivers"
)]
pub async fn update_availability(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::update_availability(&state, &actor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/drivers/{id}",
    params(("id" = i64, Path, description = "Driver user ID")),
    request_body = UpdateDriverProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Driver>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Drivers"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDriverProfileRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::update_profile(&state, &actor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/drivers/{id}/completions",
    params(("id" = i64, Path, description = "Driver user ID")),
    request_body = RecordCompletionRequest,
    responses(
        (status = 200, description = "Completion recorded", body = ApiResponse<Driver>),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Drivers"
)]
pub async fn record_completion(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<RecordCompletionRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::record_completion(&state, &actor, id, payload).await?;
    Ok(Json(resp))
}
