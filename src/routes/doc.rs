use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        areas::{AreaList, CreateAreaRequest},
        drivers::{
            DriverList, RecordCompletionRequest, RegisterDriverRequest, UpdateAvailabilityRequest,
            UpdateDriverProfileRequest,
        },
        notifications::NotificationList,
        orders::{
            CreateOrderRequest, LineItemRequest, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        pickups::{AssignDriverRequest, CreatePickupRequest, PickupList, UpdatePickupStatusRequest},
        products::{
            CreateProductRequest, ProductList, ProductWithCategories, SetCategoriesRequest,
            SetProductStatusRequest, UpdateProductRequest,
        },
    },
    models::{Category, Driver, Notification, Order, OrderItem, Pickup, Product, ProductionArea},
    response::{ApiResponse, Meta},
    routes::{areas, drivers, health, notifications, orders, params, pickups, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::set_product_status,
        products::set_categories,
        products::delete_product,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order,
        pickups::create_pickup,
        pickups::list_pickups,
        pickups::get_pickup,
        pickups::assign_driver,
        pickups::update_pickup_status,
        pickups::delete_pickup,
        drivers::register_driver,
        drivers::list_drivers,
        drivers::get_driver,
        drivers::update_availability,
        drivers::update_profile,
        drivers::record_completion,
        areas::create_area,
        areas::list_areas,
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(
        schemas(
            Product,
            Category,
            ProductionArea,
            Order,
            OrderItem,
            Pickup,
            Driver,
            Notification,
            CreateProductRequest,
            UpdateProductRequest,
            SetProductStatusRequest,
            SetCategoriesRequest,
            ProductWithCategories,
            ProductList,
            CreateOrderRequest,
            LineItemRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            CreatePickupRequest,
            AssignDriverRequest,
            UpdatePickupStatusRequest,
            PickupList,
            RegisterDriverRequest,
            UpdateAvailabilityRequest,
            UpdateDriverProfileRequest,
            RecordCompletionRequest,
            DriverList,
            CreateAreaRequest,
            AreaList,
            NotificationList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::PickupListQuery,
            params::DriverListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Pickup>,
            ApiResponse<PickupList>,
            ApiResponse<Driver>,
            ApiResponse<DriverList>,
            ApiResponse<AreaList>,
            ApiResponse<NotificationList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog and listing approval"),
        (name = "Orders", description = "Order lifecycle"),
        (name = "Pickups", description = "Pickup coordination and driver assignment"),
        (name = "Drivers", description = "Driver registry"),
        (name = "Areas", description = "Farmer production areas"),
        (name = "Notifications", description = "User notifications"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
