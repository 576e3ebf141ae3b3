pub mod driver_service;
pub mod farmer_service;
pub mod notification_service;
pub mod order_service;
pub mod pickup_service;
pub mod product_service;
