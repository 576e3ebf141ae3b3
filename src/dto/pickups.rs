use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Pickup;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePickupRequest {
    pub order_id: i64,
    pub pickup_location: String,
    pub pickup_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignDriverRequest {
    pub driver_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePickupStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PickupList {
    pub items: Vec<Pickup>,
}
