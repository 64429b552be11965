//! Response payloads shared across handlers.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};
use crate::models::{menu_category, menu_item, order, order_item, reservation, restaurant, user};
use crate::tenancy::TenantId;
use crate::validation::{is_valid_email, normalize_email, required_text};

/// A user account. Password hashes are never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub restaurant_id: i64,
    #[schema(example = "chef@bistro.example")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "Staff")]
    pub role: String,
    pub is_platform_staff: bool,
    pub is_active: bool,
    pub phone: Option<String>,
    pub timezone: String,
    pub language: String,
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<serde_json::Value>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role,
            is_platform_staff: model.is_platform_staff,
            is_active: model.is_active,
            phone: model.phone,
            timezone: model.timezone,
            language: model.language,
            preferences: model.preferences,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A restaurant as seen by platform staff.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    #[schema(example = "pending")]
    pub status: String,
    pub kam_id: Option<i64>,
    pub activated_by: Option<i64>,
    pub activated_at: Option<DateTime<FixedOffset>>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<restaurant::Model> for RestaurantResponse {
    fn from(model: restaurant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            address: model.address,
            phone: model.phone,
            email: model.email,
            status: model.status,
            kam_id: model.kam_id,
            activated_by: model.activated_by,
            activated_at: model.activated_at,
            contact_name: model.contact_name,
            contact_email: model.contact_email,
            contact_phone: model.contact_phone,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Public view of an active restaurant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicRestaurantResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<restaurant::Model> for PublicRestaurantResponse {
    fn from(model: restaurant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            address: model.address,
            phone: model.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<menu_category::Model> for CategoryResponse {
    fn from(model: menu_category::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            name: model.name,
            description: model.description,
            display_order: model.display_order,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: i64,
    pub restaurant_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents
    #[schema(example = 1250)]
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub is_available: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<menu_item::Model> for MenuItemResponse {
    fn from(model: menu_item::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            price_cents: model.price_cents,
            image_url: model.image_url,
            display_order: model.display_order,
            is_available: model.is_available,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub id: i64,
    pub restaurant_id: i64,
    pub user_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub table_number: i32,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub number_of_guests: i32,
    #[schema(example = "pending")]
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<reservation::Model> for ReservationResponse {
    fn from(model: reservation::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            user_id: model.user_id,
            guest_name: model.guest_name,
            guest_email: model.guest_email,
            guest_phone: model.guest_phone,
            table_number: model.table_number,
            start_time: model.start_time,
            end_time: model.end_time,
            number_of_guests: model.number_of_guests,
            status: model.status,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub notes: Option<String>,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            menu_item_id: model.menu_item_id,
            quantity: model.quantity,
            unit_price_cents: model.unit_price_cents,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub restaurant_id: i64,
    pub user_id: Option<i64>,
    #[schema(example = "pending")]
    pub status: String,
    /// Order total in cents
    pub total_cents: i64,
    pub notes: Option<String>,
    /// Line items; present on single-order responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            user_id: model.user_id,
            status: model.status,
            total_cents: model.total_cents,
            notes: model.notes,
            items: None,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<crate::repositories::order::OrderWithItems> for OrderResponse {
    fn from(value: crate::repositories::order::OrderWithItems) -> Self {
        let mut response = OrderResponse::from(value.order);
        response.items = Some(value.items.into_iter().map(Into::into).collect());
        response
    }
}

/// Trimmed, bounded, non-empty text field or a 400 naming the field.
pub(crate) fn text_field(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    required_text(value, max).ok_or_else(|| {
        validation_error(
            &format!("{field} is required and must be at most {max} characters"),
            json!({ "field": field }),
        )
    })
}

/// Normalized email or a 400 naming the field.
pub(crate) fn email_field(field: &str, value: &str) -> Result<String, ApiError> {
    let email = normalize_email(value);
    if !is_valid_email(&email) {
        return Err(validation_error(
            &format!("{field} must be a valid email address"),
            json!({ "field": field }),
        ));
    }
    Ok(email)
}

/// Trims optional text; blank values become `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Restaurant id taken from a path. Non-positive ids cannot exist.
pub(crate) fn path_tenant(id: i64) -> Result<TenantId, ApiError> {
    TenantId::new(id).map_err(|_| crate::error::not_found("restaurant"))
}
