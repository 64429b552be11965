//! # User Repository

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::now;
use crate::error::RepositoryError;
use crate::models::user::{self, Entity as User};
use crate::tenancy::{Role, TenantId};

/// Data for a new user inside the repository's restaurant.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_platform_staff: bool,
    pub phone: Option<String>,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub timezone: Option<String>,
    pub language: Option<String>,
}

pub struct UserRepository<'a, C> {
    db: &'a C,
    tenant: TenantId,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(db: &'a C, tenant: TenantId) -> Self {
        Self { db, tenant }
    }

    fn scoped(&self) -> sea_orm::Select<User> {
        User::find().filter(user::Column::RestaurantId.eq(self.tenant.get()))
    }

    pub async fn find(&self, id: i64) -> Result<Option<user::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(user::Column::Id.eq(id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<user::Model, RepositoryError> {
        self.find(id).await?.ok_or(RepositoryError::NotFound("user"))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<user::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Active platform KAMs (only meaningful under the platform organization).
    pub async fn list_platform_kams(&self) -> Result<Vec<user::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(user::Column::Role.eq(Role::Kam.as_str()))
            .filter(user::Column::IsPlatformStaff.eq(true))
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn count_with_role(&self, role: Role) -> Result<u64, RepositoryError> {
        Ok(self
            .scoped()
            .filter(user::Column::Role.eq(role.as_str()))
            .count(self.db)
            .await?)
    }

    /// Inserts a user; an email already used in this restaurant is a conflict.
    pub async fn create(&self, new: NewUser) -> Result<user::Model, RepositoryError> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(RepositoryError::conflict(
                "a user with this email already exists in this restaurant",
            ));
        }

        let timestamp = now();
        let model = user::ActiveModel {
            restaurant_id: Set(self.tenant.get()),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            role: Set(new.role.as_str().to_string()),
            is_platform_staff: Set(new.is_platform_staff),
            is_active: Set(true),
            phone: Set(new.phone),
            timezone: Set("UTC".to_string()),
            language: Set("en".to_string()),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
            ..Default::default()
        };

        Ok(model.insert(self.db).await?)
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<user::Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(role) = changes.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(timezone) = changes.timezone {
            active.timezone = Set(timezone);
        }
        if let Some(language) = changes.language {
            active.language = Set(language);
        }
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    pub async fn set_password_hash(
        &self,
        id: i64,
        password_hash: String,
    ) -> Result<user::Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    /// Replaces the stored preferences document wholesale.
    pub async fn set_preferences(
        &self,
        id: i64,
        preferences: serde_json::Value,
    ) -> Result<user::Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.preferences = Set(Some(preferences));
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    pub async fn set_active(&self, id: i64, is_active: bool) -> Result<user::Model, RepositoryError> {
        let mut active = self.get(id).await?.into_active_model();
        active.is_active = Set(is_active);
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        self.get(id).await?.delete(self.db).await?;
        Ok(())
    }
}

/// Credential lookup for login, before any tenant is known.
///
/// This is the only user query that is not restaurant scoped. It runs on the
/// owner connection and returns every account with `email`, optionally
/// narrowed to one restaurant.
pub async fn find_login_candidates<C: ConnectionTrait>(
    db: &C,
    email: &str,
    restaurant: Option<TenantId>,
) -> Result<Vec<user::Model>, RepositoryError> {
    let mut query = User::find().filter(user::Column::Email.eq(email));
    if let Some(restaurant) = restaurant {
        query = query.filter(user::Column::RestaurantId.eq(restaurant.get()));
    }
    Ok(query.order_by_asc(user::Column::Id).all(db).await?)
}
