//! # Data Models
//!
//! SeaORM entities for the restaurant platform. Every entity except
//! [`restaurant`] carries a `restaurant_id` and is tenant-owned.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod menu_category;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod reservation;
pub mod restaurant;
pub mod user;

pub use menu_category::Entity as MenuCategory;
pub use menu_item::Entity as MenuItem;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use reservation::Entity as Reservation;
pub use restaurant::Entity as Restaurant;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "restaurant-platform".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
