use axum::extract::FromRequestParts;

use crate::error::AppError;

/// Identity of the acting user, as asserted by the upstream auth gateway.
///
/// Authentication itself is out of scope here: the gateway terminates the
/// session and injects `X-User-Id` / `X-User-Role` headers, which this core
/// trusts. Roles mirror the user table: consumer, farmer, staff, driver.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i64,
    pub role: String,
}

pub fn ensure_role(actor: &Actor, role: &str) -> Result<(), AppError> {
    if actor.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_staff(actor: &Actor) -> Result<(), AppError> {
    ensure_role(actor, "staff")
}

pub fn ensure_farmer(actor: &Actor) -> Result<(), AppError> {
    ensure_role(actor, "farmer")
}

pub fn ensure_driver(actor: &Actor) -> Result<(), AppError> {
    ensure_role(actor, "driver")
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Validation("Missing X-User-Id header".into()))?
            .parse::<i64>()
            .map_err(|_| AppError::Validation("Invalid X-User-Id header".into()))?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Validation("Missing X-User-Role header".into()))?
            .to_string();

        Ok(Actor { user_id, role })
    }
}
