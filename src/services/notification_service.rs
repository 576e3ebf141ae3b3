use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    dto::notifications::NotificationList,
    entity::notifications::{
        ActiveModel as NotificationActive, Column as NotificationCol, Entity as Notifications,
        Model as NotificationModel,
    },
    error::{AppError, AppResult},
    middleware::auth::Actor,
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_notifications(
    state: &AppState,
    actor: &Actor,
    pagination: Pagination,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Notifications::find()
        .filter(NotificationCol::UserId.eq(actor.user_id))
        .order_by_desc(NotificationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(notification_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items },
        Some(meta),
    ))
}

pub async fn mark_read(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> AppResult<ApiResponse<Notification>> {
    let notification = Notifications::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if notification.user_id != actor.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: NotificationActive = notification.into();
    active.is_read = Set(true);
    let notification = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Marked read",
        notification_from_entity(notification),
        Some(Meta::empty()),
    ))
}

fn notification_from_entity(model: NotificationModel) -> Notification {
    Notification {
        id: model.id,
        user_id: model.user_id,
        message: model.message,
        notif_type: model.notif_type,
        reference_id: model.reference_id,
        is_read: model.is_read,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
