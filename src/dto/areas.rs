use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ProductionArea;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAreaRequest {
    pub barangay: String,
    pub crop_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AreaList {
    pub items: Vec<ProductionArea>,
}
