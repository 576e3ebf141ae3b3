use crate::{db::DbPool, error::AppResult};

/// Fire-and-forget notification dispatch.
///
/// Invoked after the triggering transaction has committed; a failed insert is
/// logged by the caller and never affects the primary operation's outcome.
pub async fn dispatch(
    pool: &DbPool,
    user_id: i64,
    message: &str,
    notif_type: &str,
    reference_id: Option<i64>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, message, notif_type, reference_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(message)
    .bind(notif_type)
    .bind(reference_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Dispatch and swallow, logging at warn. The standard call site shape for
/// post-commit notifications.
pub async fn dispatch_quietly(
    pool: &DbPool,
    user_id: i64,
    message: &str,
    notif_type: &str,
    reference_id: Option<i64>,
) {
    if let Err(err) = dispatch(pool, user_id, message, notif_type, reference_id).await {
        tracing::warn!(error = %err, user_id, notif_type, "notification dispatch failed");
    }
}
