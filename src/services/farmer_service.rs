use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    dto::areas::{AreaList, CreateAreaRequest},
    entity::{
        production_areas::{
            ActiveModel as AreaActive, Column as AreaCol, Entity as ProductionAreas,
            Model as AreaModel,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::Actor,
    models::ProductionArea,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// The seller check used by the catalog: the acting user must exist and
/// carry the farmer role.
pub async fn ensure_farmer<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<()> {
    let farmer = Users::find_by_id(user_id)
        .filter(UserCol::Role.eq("farmer"))
        .one(conn)
        .await?;
    if farmer.is_none() {
        return Err(AppError::Validation(format!(
            "User {user_id} is not a registered farmer"
        )));
    }
    Ok(())
}

/// Every referenced production area must exist and belong to the farmer; a
/// product can only claim fields its seller actually works.
pub async fn ensure_owns_areas<C: ConnectionTrait>(
    conn: &C,
    farmer_id: i64,
    area_ids: &[i64],
) -> AppResult<()> {
    let mut ids = area_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let owned = ProductionAreas::find()
        .filter(AreaCol::Id.is_in(ids.clone()))
        .filter(AreaCol::FarmerId.eq(farmer_id))
        .count(conn)
        .await?;
    if owned as usize != ids.len() {
        return Err(AppError::Validation(format!(
            "Production area not found or not owned by farmer {farmer_id}"
        )));
    }
    Ok(())
}

pub async fn create_area(
    state: &AppState,
    actor: &Actor,
    payload: CreateAreaRequest,
) -> AppResult<ApiResponse<ProductionArea>> {
    if payload.barangay.trim().is_empty() || payload.crop_name.trim().is_empty() {
        return Err(AppError::Validation(
            "barangay and crop_name are required".into(),
        ));
    }

    ensure_farmer(&state.orm, actor.user_id).await?;

    let area = AreaActive {
        id: NotSet,
        farmer_id: Set(actor.user_id),
        barangay: Set(payload.barangay),
        crop_name: Set(payload.crop_name),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Production area recorded",
        area_from_entity(area),
        Some(Meta::empty()),
    ))
}

/// Farmers see their own fields; staff see everyone's.
pub async fn list_areas(
    state: &AppState,
    actor: &Actor,
    pagination: Pagination,
) -> AppResult<ApiResponse<AreaList>> {
    let (page, limit, offset) = pagination.normalize();

    let mut condition = Condition::all();
    if actor.role != "staff" {
        condition = condition.add(AreaCol::FarmerId.eq(actor.user_id));
    }

    let finder = ProductionAreas::find()
        .filter(condition)
        .order_by_asc(AreaCol::Barangay);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(area_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Areas", AreaList { items }, Some(meta)))
}

fn area_from_entity(model: AreaModel) -> ProductionArea {
    ProductionArea {
        id: model.id,
        farmer_id: model.farmer_id,
        barangay: model.barangay,
        crop_name: model.crop_name,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
