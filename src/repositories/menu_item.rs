//! # Menu Item Repository
//!
//! Items reference a category of the same restaurant. The category check runs
//! through the tenant filter, so a category id from another restaurant reads
//! as missing.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::{MenuCategoryRepository, now};
use crate::error::RepositoryError;
use crate::models::menu_item::{self, Entity as MenuItem};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::tenancy::TenantId;

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MenuItemChanges {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_available: Option<bool>,
}

/// Filters for listing menu items.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuItemFilter {
    pub category_id: Option<i64>,
    pub available_only: bool,
}

pub struct MenuItemRepository<'a, C> {
    db: &'a C,
    tenant: TenantId,
}

fn check_price(price_cents: i64) -> Result<(), RepositoryError> {
    if price_cents < 0 {
        return Err(RepositoryError::validation_error("price must not be negative"));
    }
    Ok(())
}

impl<'a, C: ConnectionTrait> MenuItemRepository<'a, C> {
    pub fn new(db: &'a C, tenant: TenantId) -> Self {
        Self { db, tenant }
    }

    fn scoped(&self) -> sea_orm::Select<MenuItem> {
        MenuItem::find().filter(menu_item::Column::RestaurantId.eq(self.tenant.get()))
    }

    pub async fn list(&self, filter: MenuItemFilter) -> Result<Vec<menu_item::Model>, RepositoryError> {
        let mut query = self.scoped();
        if let Some(category_id) = filter.category_id {
            query = query.filter(menu_item::Column::CategoryId.eq(category_id));
        }
        if filter.available_only {
            query = query.filter(menu_item::Column::IsAvailable.eq(true));
        }
        Ok(query
            .order_by_asc(menu_item::Column::DisplayOrder)
            .order_by_asc(menu_item::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn find(&self, id: i64) -> Result<Option<menu_item::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(menu_item::Column::Id.eq(id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<menu_item::Model, RepositoryError> {
        self.find(id)
            .await?
            .ok_or(RepositoryError::NotFound("menu item"))
    }

    /// Items with the given ids; ids of other restaurants are silently absent.
    pub async fn find_many(&self, ids: &[i64]) -> Result<Vec<menu_item::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(menu_item::Column::Id.is_in(ids.iter().copied()))
            .all(self.db)
            .await?)
    }

    pub async fn create(&self, new: NewMenuItem) -> Result<menu_item::Model, RepositoryError> {
        check_price(new.price_cents)?;
        MenuCategoryRepository::new(self.db, self.tenant)
            .get(new.category_id)
            .await?;

        let timestamp = now();
        let model = menu_item::ActiveModel {
            restaurant_id: Set(self.tenant.get()),
            category_id: Set(new.category_id),
            name: Set(new.name),
            description: Set(new.description),
            price_cents: Set(new.price_cents),
            image_url: Set(new.image_url),
            display_order: Set(new.display_order),
            is_available: Set(new.is_available),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
            ..Default::default()
        };
        Ok(model.insert(self.db).await?)
    }

    pub async fn update(
        &self,
        id: i64,
        changes: MenuItemChanges,
    ) -> Result<menu_item::Model, RepositoryError> {
        let item = self.get(id).await?;
        if let Some(price_cents) = changes.price_cents {
            check_price(price_cents)?;
        }
        if let Some(category_id) = changes.category_id {
            MenuCategoryRepository::new(self.db, self.tenant)
                .get(category_id)
                .await?;
        }

        let mut active = item.into_active_model();
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(price_cents) = changes.price_cents {
            active.price_cents = Set(price_cents);
        }
        if let Some(image_url) = changes.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(display_order) = changes.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_available) = changes.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    /// Deletes an item that was never ordered. Ordered items stay for the
    /// order history and can only be made unavailable.
    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let item = self.get(id).await?;
        let ordered = OrderItem::find()
            .filter(order_item::Column::RestaurantId.eq(self.tenant.get()))
            .filter(order_item::Column::MenuItemId.eq(id))
            .count(self.db)
            .await?;
        if ordered > 0 {
            return Err(RepositoryError::conflict(
                "menu item appears on orders; mark it unavailable instead",
            ));
        }
        item.delete(self.db).await?;
        Ok(())
    }
}
