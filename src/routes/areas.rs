use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::areas::{AreaList, CreateAreaRequest},
    error::AppResult,
    middleware::auth::Actor,
    models::ProductionArea,
    response::ApiResponse,
    routes::params::Pagination,
    services::farmer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_area))
        .route("/", get(list_areas))
}

#[utoipa::path(
    post,
    path = "/api/areas",
    request_body = CreateAreaRequest,
    responses(
        (status = 200, description = "Production area recorded", body = ApiResponse<ProductionArea>),
        (status = 400, description = "Invalid payload"),
    ),
    tag = "Areas"
)]
pub async fn create_area(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateAreaRequest>,
) -> AppResult<Json<ApiResponse<ProductionArea>>> {
    let resp = farmer_service::create_area(&state, &actor, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/areas",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List production areas", body = ApiResponse<AreaList>)
    ),
    tag = "Areas"
)]
pub async fn list_areas(
    State(state): State<AppState>,
    actor: Actor,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<AreaList>>> {
    let resp = farmer_service::list_areas(&state, &actor, pagination).await?;
    Ok(Json(resp))
}
