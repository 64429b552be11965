//! # Order Repository
//!
//! Orders are written together with their line items. Prices are taken from
//! the menu at order time; line items repeat the order's `restaurant_id`.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};

use super::{MenuItemRepository, now};
use crate::error::RepositoryError;
use crate::models::order::{self, Entity as Order, OrderStatus};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::tenancy::TenantId;

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i64>,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

/// An order with its line items.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

pub struct OrderRepository<'a, C> {
    db: &'a C,
    tenant: TenantId,
}

impl<'a, C: ConnectionTrait> OrderRepository<'a, C> {
    pub fn new(db: &'a C, tenant: TenantId) -> Self {
        Self { db, tenant }
    }

    fn scoped(&self) -> sea_orm::Select<Order> {
        Order::find().filter(order::Column::RestaurantId.eq(self.tenant.get()))
    }

    /// Orders newest first; `user_id` narrows to one customer.
    pub async fn list(&self, user_id: Option<i64>) -> Result<Vec<order::Model>, RepositoryError> {
        let mut query = self.scoped();
        if let Some(user_id) = user_id {
            query = query.filter(order::Column::UserId.eq(user_id));
        }
        Ok(query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<order::Model, RepositoryError> {
        self.scoped()
            .filter(order::Column::Id.eq(id))
            .one(self.db)
            .await?
            .ok_or(RepositoryError::NotFound("order"))
    }

    pub async fn get_with_items(&self, id: i64) -> Result<OrderWithItems, RepositoryError> {
        let order = self.get(id).await?;
        let items = order
            .find_related(OrderItem)
            .filter(order_item::Column::RestaurantId.eq(self.tenant.get()))
            .order_by_asc(order_item::Column::Id)
            .all(self.db)
            .await?;
        Ok(OrderWithItems { order, items })
    }

    /// Creates a `pending` order. Every line must reference an available menu
    /// item of this restaurant; the total is the sum of unit price times
    /// quantity.
    pub async fn create(&self, new: NewOrder) -> Result<OrderWithItems, RepositoryError> {
        if new.lines.is_empty() {
            return Err(RepositoryError::validation_error(
                "an order needs at least one item",
            ));
        }
        if new.lines.iter().any(|line| line.quantity <= 0) {
            return Err(RepositoryError::validation_error(
                "item quantity must be positive",
            ));
        }

        let ids: Vec<i64> = new.lines.iter().map(|line| line.menu_item_id).collect();
        let menu: HashMap<i64, _> = MenuItemRepository::new(self.db, self.tenant)
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut total_cents: i64 = 0;
        let mut priced = Vec::with_capacity(new.lines.len());
        for line in new.lines {
            let item = menu
                .get(&line.menu_item_id)
                .ok_or(RepositoryError::NotFound("menu item"))?;
            if !item.is_available {
                return Err(RepositoryError::validation_error(format!(
                    "menu item '{}' is not available",
                    item.name
                )));
            }
            let line_total = item
                .price_cents
                .checked_mul(i64::from(line.quantity))
                .and_then(|amount| total_cents.checked_add(amount))
                .ok_or_else(|| RepositoryError::validation_error("order total is too large"))?;
            total_cents = line_total;
            priced.push((line, item.price_cents));
        }

        let timestamp = now();
        let order = order::ActiveModel {
            restaurant_id: Set(self.tenant.get()),
            user_id: Set(new.user_id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            total_cents: Set(total_cents),
            notes: Set(new.notes),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
            ..Default::default()
        }
        .insert(self.db)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (line, unit_price_cents) in priced {
            let item = order_item::ActiveModel {
                restaurant_id: Set(order.restaurant_id),
                order_id: Set(order.id),
                menu_item_id: Set(line.menu_item_id),
                quantity: Set(line.quantity),
                unit_price_cents: Set(unit_price_cents),
                notes: Set(line.notes),
                created_at: Set(timestamp),
                ..Default::default()
            }
            .insert(self.db)
            .await?;
            items.push(item);
        }

        Ok(OrderWithItems { order, items })
    }

    /// Moves an order to `status`. Completed and cancelled orders are final.
    pub async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<order::Model, RepositoryError> {
        let order = self.get(id).await?;
        if order
            .status
            .parse::<OrderStatus>()
            .is_ok_and(OrderStatus::is_final)
            && order.status != status.as_str()
        {
            return Err(RepositoryError::conflict(format!(
                "order is already {}",
                order.status
            )));
        }

        let mut active = order.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }
}
