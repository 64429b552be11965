pub use sea_orm_migration::prelude::*;

mod m2024_01_01_000001_create_restaurants;
mod m2024_01_01_000002_create_users;
mod m2024_01_01_000003_create_menu;
mod m2024_01_01_000004_create_reservations;
mod m2024_01_01_000005_create_orders;
mod m2024_01_01_000006_link_restaurant_staff;
mod m2024_01_01_000007_enable_row_level_security;
mod m2024_01_01_000008_add_user_preferences;

/// Name of the database role tenant-scoped sessions switch into.
pub const APP_DB_ROLE: &str = "restaurant_app_user";

/// Transaction-local setting holding the bound restaurant id.
pub const CURRENT_RESTAURANT_SETTING: &str = "app.current_restaurant";

/// Transaction-local setting holding the bound user role.
pub const CURRENT_ROLE_SETTING: &str = "app.current_user_role";

/// Tables carrying a `restaurant_id` column and guarded by a row-level policy.
pub const TENANT_TABLES: &[&str] = &[
    "users",
    "menu_categories",
    "menu_items",
    "reservations",
    "orders",
    "order_items",
];

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_01_01_000001_create_restaurants::Migration),
            Box::new(m2024_01_01_000002_create_users::Migration),
            Box::new(m2024_01_01_000003_create_menu::Migration),
            Box::new(m2024_01_01_000004_create_reservations::Migration),
            Box::new(m2024_01_01_000005_create_orders::Migration),
            Box::new(m2024_01_01_000006_link_restaurant_staff::Migration),
            Box::new(m2024_01_01_000007_enable_row_level_security::Migration),
            Box::new(m2024_01_01_000008_add_user_preferences::Migration),
        ]
    }
}
