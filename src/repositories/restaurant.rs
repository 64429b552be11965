//! # Restaurant Repository
//!
//! The restaurants table is the platform directory: it is not tenant-owned and
//! carries no row-level policy. Callers gate access (platform staff, public
//! registration, or a tenant reading its own row).

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::now;
use crate::error::RepositoryError;
use crate::models::restaurant::{self, Entity as Restaurant, RestaurantStatus};
use crate::tenancy::{PLATFORM_ORGANIZATION_ID, TenantId};

/// Data for a restaurant registering itself.
#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

pub struct RestaurantRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> RestaurantRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Creates a restaurant in the `pending` state.
    pub async fn create_pending(
        &self,
        new: NewRestaurant,
    ) -> Result<restaurant::Model, RepositoryError> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(RepositoryError::conflict(
                "a restaurant with this email is already registered",
            ));
        }

        let timestamp = now();
        let model = restaurant::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            address: Set(new.address),
            phone: Set(new.phone),
            email: Set(new.email),
            status: Set(RestaurantStatus::Pending.as_str().to_string()),
            kam_id: Set(None),
            activated_by: Set(None),
            activated_at: Set(None),
            contact_name: Set(new.contact_name),
            contact_email: Set(new.contact_email),
            contact_phone: Set(new.contact_phone),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
            ..Default::default()
        };

        Ok(model.insert(self.db).await?)
    }

    pub async fn find(&self, id: TenantId) -> Result<Option<restaurant::Model>, RepositoryError> {
        Ok(Restaurant::find_by_id(id.get()).one(self.db).await?)
    }

    pub async fn get(&self, id: TenantId) -> Result<restaurant::Model, RepositoryError> {
        self.find(id)
            .await?
            .ok_or(RepositoryError::NotFound("restaurant"))
    }

    /// Reads the row with a row lock held until the surrounding transaction
    /// ends. Locking is only issued on Postgres.
    pub async fn get_for_update(&self, id: TenantId) -> Result<restaurant::Model, RepositoryError> {
        let mut query = Restaurant::find_by_id(id.get());
        if self.db.get_database_backend() == DatabaseBackend::Postgres {
            query = query.lock_exclusive();
        }
        query
            .one(self.db)
            .await?
            .ok_or(RepositoryError::NotFound("restaurant"))
    }

    /// Active restaurant open to the public and to self-registration; anything
    /// else, including the platform organization, is absent.
    pub async fn find_active(
        &self,
        id: TenantId,
    ) -> Result<Option<restaurant::Model>, RepositoryError> {
        if id.is_platform() {
            return Ok(None);
        }
        Ok(Restaurant::find_by_id(id.get())
            .filter(restaurant::Column::Status.eq(RestaurantStatus::Active.as_str()))
            .one(self.db)
            .await?)
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<restaurant::Model>, RepositoryError> {
        Ok(Restaurant::find()
            .filter(restaurant::Column::Email.eq(email))
            .one(self.db)
            .await?)
    }

    /// Lists tenants, newest first. The platform organization is never listed.
    pub async fn list(
        &self,
        status: Option<RestaurantStatus>,
    ) -> Result<Vec<restaurant::Model>, RepositoryError> {
        let mut query = Restaurant::find()
            .filter(restaurant::Column::Id.ne(PLATFORM_ORGANIZATION_ID.get()))
            .order_by_desc(restaurant::Column::CreatedAt)
            .order_by_desc(restaurant::Column::Id);
        if let Some(status) = status {
            query = query.filter(restaurant::Column::Status.eq(status.as_str()));
        }
        Ok(query.all(self.db).await?)
    }

    pub async fn exists(&self, id: TenantId) -> Result<bool, RepositoryError> {
        let count = Restaurant::find_by_id(id.get()).count(self.db).await?;
        Ok(count > 0)
    }

    pub async fn set_status(
        &self,
        restaurant: restaurant::Model,
        status: RestaurantStatus,
    ) -> Result<restaurant::Model, RepositoryError> {
        let mut active = restaurant.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    /// Records a completed activation by `actor`.
    pub async fn mark_activated(
        &self,
        restaurant: restaurant::Model,
        actor: i64,
        kam_id: Option<i64>,
    ) -> Result<restaurant::Model, RepositoryError> {
        let timestamp = now();
        let mut active = restaurant.into_active_model();
        active.status = Set(RestaurantStatus::Active.as_str().to_string());
        active.activated_by = Set(Some(actor));
        active.activated_at = Set(Some(timestamp));
        active.kam_id = Set(kam_id);
        active.updated_at = Set(timestamp);
        Ok(active.update(self.db).await?)
    }

    pub async fn assign_kam(
        &self,
        restaurant: restaurant::Model,
        kam_id: i64,
    ) -> Result<restaurant::Model, RepositoryError> {
        let mut active = restaurant.into_active_model();
        active.kam_id = Set(Some(kam_id));
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }
}
