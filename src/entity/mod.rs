pub mod audit_logs;
pub mod categories;
pub mod drivers;
pub mod feedback;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod pickups;
pub mod product_areas;
pub mod product_categories;
pub mod production_areas;
pub mod products;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use drivers::Entity as Drivers;
pub use feedback::Entity as Feedback;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use pickups::Entity as Pickups;
pub use product_areas::Entity as ProductAreas;
pub use product_categories::Entity as ProductCategories;
pub use production_areas::Entity as ProductionAreas;
pub use products::Entity as Products;
pub use users::Entity as Users;
