use axum::Router;

use crate::state::AppState;

pub mod areas;
pub mod doc;
pub mod drivers;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod pickups;
pub mod products;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/pickups", pickups::router())
        .nest("/drivers", drivers::router())
        .nest("/areas", areas::router())
        .nest("/notifications", notifications::router())
}
