use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Driver;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterDriverRequest {
    pub user_id: i64,
    pub vehicle_type: String,
    pub max_load_capacity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAvailabilityRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDriverProfileRequest {
    pub vehicle_type: Option<String>,
    pub max_load_capacity: Option<i32>,
    pub current_location: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordCompletionRequest {
    pub rating: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DriverList {
    pub items: Vec<Driver>,
}
