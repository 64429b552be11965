//! # Menu Category Handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use super::types::{CategoryResponse, optional_text, text_field};
use crate::auth::require_role;
use crate::error::ApiError;
use crate::repositories::MenuCategoryRepository;
use crate::repositories::menu_category::{CategoryChanges, NewCategory};
use crate::server::AppState;
use crate::tenancy::{Role, TenantContext, TenantSession};

const MENU_EDITORS: &[Role] = &[Role::Admin, Role::Staff];

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Starters")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Fields to change; omitted fields are left as they are.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// List the restaurant's menu categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories ordered by display order", body = [CategoryResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let categories = MenuCategoryRepository::new(session.conn(), session.tenant())
        .list(false)
        .await?;
    session.commit().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Get a single category
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn get_category(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let category = MenuCategoryRepository::new(session.conn(), session.tenant())
        .get(id)
        .await?;
    session.commit().await?;
    Ok(Json(category.into()))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 409, description = "Category name already taken", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn create_category(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    require_role(&ctx, MENU_EDITORS)?;
    let new = NewCategory {
        name: text_field("name", &request.name, 100)?,
        description: optional_text(request.description),
        display_order: request.display_order,
        is_active: request.is_active,
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let category = MenuCategoryRepository::new(session.conn(), session.tenant())
        .create(new)
        .await?;
    session.commit().await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Category name already taken", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn update_category(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    require_role(&ctx, MENU_EDITORS)?;
    let changes = CategoryChanges {
        name: request
            .name
            .map(|name| text_field("name", &name, 100))
            .transpose()?,
        description: request.description,
        display_order: request.display_order,
        is_active: request.is_active,
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let category = MenuCategoryRepository::new(session.conn(), session.tenant())
        .update(id, changes)
        .await?;
    session.commit().await?;
    Ok(Json(category.into()))
}

/// Delete an empty category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Category still holds menu items", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_role(&ctx, MENU_EDITORS)?;
    let session = TenantSession::begin(&state.db, &ctx).await?;
    MenuCategoryRepository::new(session.conn(), session.tenant())
        .delete(id)
        .await?;
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
