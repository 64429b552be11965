//! # Repository Layer
//!
//! SeaORM data access for every entity. Tenant-owned repositories are built
//! with an explicit [`TenantId`](crate::tenancy::TenantId) and add a
//! `restaurant_id` predicate to every statement they issue, reads and writes
//! alike. Row-level security on Postgres is a second, independent layer.
//!
//! Repositories are generic over [`sea_orm::ConnectionTrait`] so the same code
//! runs on a bound [`TenantSession`](crate::tenancy::TenantSession)
//! transaction or on a plain connection.

pub mod menu_category;
pub mod menu_item;
pub mod order;
pub mod reservation;
pub mod restaurant;
pub mod user;

pub use menu_category::MenuCategoryRepository;
pub use menu_item::MenuItemRepository;
pub use order::OrderRepository;
pub use reservation::ReservationRepository;
pub use restaurant::RestaurantRepository;
pub use user::UserRepository;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}
