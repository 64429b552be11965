//! # Menu Category Repository

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::now;
use crate::error::RepositoryError;
use crate::models::menu_category::{self, Entity as MenuCategory};
use crate::models::menu_item::{self, Entity as MenuItem};
use crate::tenancy::TenantId;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

pub struct MenuCategoryRepository<'a, C> {
    db: &'a C,
    tenant: TenantId,
}

impl<'a, C: ConnectionTrait> MenuCategoryRepository<'a, C> {
    pub fn new(db: &'a C, tenant: TenantId) -> Self {
        Self { db, tenant }
    }

    fn scoped(&self) -> sea_orm::Select<MenuCategory> {
        MenuCategory::find().filter(menu_category::Column::RestaurantId.eq(self.tenant.get()))
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<menu_category::Model>, RepositoryError> {
        let mut query = self.scoped();
        if active_only {
            query = query.filter(menu_category::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(menu_category::Column::DisplayOrder)
            .order_by_asc(menu_category::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn find(&self, id: i64) -> Result<Option<menu_category::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(menu_category::Column::Id.eq(id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<menu_category::Model, RepositoryError> {
        self.find(id)
            .await?
            .ok_or(RepositoryError::NotFound("category"))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i64>) -> Result<(), RepositoryError> {
        let mut query = self.scoped().filter(menu_category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(menu_category::Column::Id.ne(id));
        }
        if query.count(self.db).await? > 0 {
            return Err(RepositoryError::conflict("category name already taken"));
        }
        Ok(())
    }

    pub async fn create(&self, new: NewCategory) -> Result<menu_category::Model, RepositoryError> {
        self.ensure_name_free(&new.name, None).await?;

        let timestamp = now();
        let model = menu_category::ActiveModel {
            restaurant_id: Set(self.tenant.get()),
            name: Set(new.name),
            description: Set(new.description),
            display_order: Set(new.display_order),
            is_active: Set(new.is_active),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
            ..Default::default()
        };
        Ok(model.insert(self.db).await?)
    }

    pub async fn update(
        &self,
        id: i64,
        changes: CategoryChanges,
    ) -> Result<menu_category::Model, RepositoryError> {
        let category = self.get(id).await?;
        if let Some(name) = changes.name.as_deref() {
            self.ensure_name_free(name, Some(id)).await?;
        }

        let mut active = category.into_active_model();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(display_order) = changes.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    /// Deletes a category that no longer holds menu items.
    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let category = self.get(id).await?;
        let items = MenuItem::find()
            .filter(menu_item::Column::RestaurantId.eq(self.tenant.get()))
            .filter(menu_item::Column::CategoryId.eq(id))
            .count(self.db)
            .await?;
        if items > 0 {
            return Err(RepositoryError::conflict(
                "category still contains menu items",
            ));
        }
        category.delete(self.db).await?;
        Ok(())
    }
}
