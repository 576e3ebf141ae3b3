use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};

use crate::{
    dto::pickups::{
        AssignDriverRequest, CreatePickupRequest, PickupList, UpdatePickupStatusRequest,
    },
    error::AppResult,
    middleware::auth::Actor,
    models::Pickup,
    response::ApiResponse,
    routes::params::{DeletePickupQuery, PickupListQuery},
    services::pickup_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_pickup))
        .route("/", get(list_pickups))
        .route("/{id}", get(get_pickup))
        .route("/{id}", delete(delete_pickup))
        .route("/{id}/assign", patch(assign_driver))
        .route("/{id}/status", patch(update_pickup_status))
}

#[utoipa::path(
    post,
    path = "/api/pickups",
    request_body = CreatePickupRequest,
    responses(
        (status = 200, description = "Pickup created", body = ApiResponse<Pickup>),
        (status = 409, description = "Order already has a pickup"),
    ),
    tag = "Pickups"
)]
pub async fn create_pickup(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreatePickupRequest>,
) -> AppResult<Json<ApiResponse<Pickup>>> {
    let resp = pickup_service::create_pickup(&state, &actor, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pickups",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("driver_id" = Option<i64>, Query, description = "Filter by assigned driver"),
    ),
    responses(
        (status = 200, description = "List pickups", body = ApiResponse<PickupList>)
    ),
    tag = "Pickups"
)]
pub async fn list_pickups(
    State(state): State<AppState>,
    Query(query): Query<PickupListQuery>,
) -> AppResult<Json<ApiResponse<PickupList>>> {
    let resp = pickup_service::list_pickups(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pickups/{id}",
    params(("id" = i64, Path, description = "Pickup ID")),
    responses(
        (status = 200, description = "Pickup", body = ApiResponse<Pickup>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Pickups"
)]
pub async fn get_pickup(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Pickup>>> {
    let resp = pickup_service::get_pickup(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/pickups/{id}/assign",
    params(("id" = i64, Path, description = "Pickup ID")),
    request_body = AssignDriverRequest,
    responses(
        (status = 200, description = "Driver assigned", body = ApiResponse<Pickup>),
        (status = 409, description = "Driver not available"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Pickups"
)]
pub async fn assign_driver(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<AssignDriverRequest>,
) -> AppResult<Json<ApiResponse<Pickup>>> {
    let resp = pickup_service::assign_driver(&state, &actor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/pickups/{id}/status",
    params(("id" = i64, Path, description = "Pickup ID")),
    request_body = UpdatePickupStatusRequest,
    responses(
        (status = 200, description = "Pickup status updated", body = ApiResponse<Pickup>),
        (status = 409, description = "Status not in the allow-list"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Pickups"
)]
pub async fn update_pickup_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePickupStatusRequest>,
) -> AppResult<Json<ApiResponse<Pickup>>> {
    let resp = pickup_service::transition_status(&state, &actor, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/pickups/{id}",
    params(
        ("id" = i64, Path, description = "Pickup ID"),
        ("force" = Option<bool>, Query, description = "Staff override for non-pending pickups"),
    ),
    responses(
        (status = 200, description = "Pickup deleted"),
        (status = 409, description = "Pickup already in progress"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Pickups"
)]
pub async fn delete_pickup(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i64>,
    Query(query): Query<DeletePickupQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        pickup_service::delete_pickup(&state, &actor, id, query.force.unwrap_or(false)).await?;
    Ok(Json(resp))
}
