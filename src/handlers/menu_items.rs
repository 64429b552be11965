//! # Menu Item Handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::types::{MenuItemResponse, optional_text, text_field};
use crate::auth::require_role;
use crate::error::ApiError;
use crate::repositories::MenuItemRepository;
use crate::repositories::menu_item::{MenuItemChanges, MenuItemFilter, NewMenuItem};
use crate::server::AppState;
use crate::tenancy::{Role, TenantContext, TenantSession};

const MENU_EDITORS: &[Role] = &[Role::Admin, Role::Staff];

#[derive(Debug, Deserialize, IntoParams)]
pub struct MenuItemQuery {
    /// Only items of this category
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub category_id: i64,
    #[schema(example = "Margherita")]
    pub name: String,
    pub description: Option<String>,
    /// Price in cents, not negative
    #[schema(example = 1250)]
    pub price_cents: i64,
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
    pub is_available: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// List menu items
#[utoipa::path(
    get,
    path = "/api/v1/menu-items",
    security(("bearer_auth" = [])),
    params(MenuItemQuery),
    responses(
        (status = 200, description = "Menu items", body = [MenuItemResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiQuery(query): ApiQuery<MenuItemQuery>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let items = MenuItemRepository::new(session.conn(), session.tenant())
        .list(MenuItemFilter {
            category_id: query.category_id,
            available_only: false,
        })
        .await?;
    session.commit().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Get a menu item
#[utoipa::path(
    get,
    path = "/api/v1/menu-items/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let item = MenuItemRepository::new(session.conn(), session.tenant())
        .get(id)
        .await?;
    session.commit().await?;
    Ok(Json(item.into()))
}

/// Create a menu item in one of the restaurant's categories
#[utoipa::path(
    post,
    path = "/api/v1/menu-items",
    security(("bearer_auth" = [])),
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    require_role(&ctx, MENU_EDITORS)?;
    let new = NewMenuItem {
        category_id: request.category_id,
        name: text_field("name", &request.name, 255)?,
        description: optional_text(request.description),
        price_cents: request.price_cents,
        image_url: optional_text(request.image_url),
        display_order: request.display_order,
        is_available: request.is_available,
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let item = MenuItemRepository::new(session.conn(), session.tenant())
        .create(new)
        .await?;
    session.commit().await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// Update a menu item
#[utoipa::path(
    put,
    path = "/api/v1/menu-items/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Menu item or category not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    require_role(&ctx, MENU_EDITORS)?;
    let changes = MenuItemChanges {
        category_id: request.category_id,
        name: request
            .name
            .map(|name| text_field("name", &name, 255))
            .transpose()?,
        description: request.description,
        price_cents: request.price_cents,
        image_url: request.image_url,
        display_order: request.display_order,
        is_available: request.is_available,
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let item = MenuItemRepository::new(session.conn(), session.tenant())
        .update(id, changes)
        .await?;
    session.commit().await?;
    Ok(Json(item.into()))
}

/// Delete a menu item
#[utoipa::path(
    delete,
    path = "/api/v1/menu-items/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Menu item id")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Menu item not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_role(&ctx, MENU_EDITORS)?;
    let session = TenantSession::begin(&state.db, &ctx).await?;
    MenuItemRepository::new(session.conn(), session.tenant())
        .delete(id)
        .await?;
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
