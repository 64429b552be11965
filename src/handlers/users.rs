//! # User Management Handlers
//!
//! Restaurant admins manage the accounts of their own restaurant. Platform
//! roles are never assignable here.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use super::types::{UserResponse, email_field, optional_text, text_field};
use crate::auth::require_role;
use crate::error::{ApiError, validation_error};
use crate::password::{check_password_policy, hash_password};
use crate::repositories::UserRepository;
use crate::repositories::user::{NewUser, UserChanges};
use crate::server::AppState;
use crate::tenancy::{Role, TenantContext, TenantSession};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    #[schema(example = "Europe/Paris")]
    pub timezone: Option<String>,
    #[schema(example = "fr")]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

fn assignable(role: Role) -> Result<Role, ApiError> {
    if role.is_tenant_assignable() {
        Ok(role)
    } else {
        Err(validation_error(
            &format!("role {role} cannot be assigned to restaurant users"),
            json!({ "field": "role" }),
        ))
    }
}

fn not_self(ctx: &TenantContext, id: i64, action: &str) -> Result<(), ApiError> {
    if ctx.user_id == id {
        return Err(validation_error(
            &format!("you cannot {action} your own account"),
            json!({ "field": "id" }),
        ));
    }
    Ok(())
}

/// List the restaurant's users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 403, description = "Admin role required", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_role(&ctx, &[Role::Admin])?;
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let users = UserRepository::new(session.conn(), session.tenant())
        .list()
        .await?;
    session.commit().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    require_role(&ctx, &[Role::Admin])?;
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .get(id)
        .await?;
    session.commit().await?;
    Ok(Json(user.into()))
}

/// Create a user in the admin's restaurant
#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 409, description = "Email already used in this restaurant", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_role(&ctx, &[Role::Admin])?;
    let role = assignable(request.role)?;
    let email = email_field("email", &request.email)?;
    let first_name = text_field("first_name", &request.first_name, 100)?;
    let last_name = text_field("last_name", &request.last_name, 100)?;
    check_password_policy(&request.password)
        .map_err(|message| validation_error(&message, json!({ "field": "password" })))?;
    let password_hash = hash_password(&request.password, state.config.password_hash_cost).await?;

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .create(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
            role,
            is_platform_staff: false,
            phone: optional_text(request.phone),
        })
        .await?;
    session.commit().await?;

    tracing::info!(user_id = user.id, created_by = ctx.user_id, role = %role, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Update a user's profile or role
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_role(&ctx, &[Role::Admin])?;
    let role = request.role.map(assignable).transpose()?;
    if role.is_some_and(|role| role != ctx.role) {
        not_self(&ctx, id, "change the role of")?;
    }
    let changes = UserChanges {
        first_name: request
            .first_name
            .map(|name| text_field("first_name", &name, 100))
            .transpose()?,
        last_name: request
            .last_name
            .map(|name| text_field("last_name", &name, 100))
            .transpose()?,
        phone: optional_text(request.phone),
        role,
        timezone: optional_text(request.timezone),
        language: optional_text(request.language),
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .update(id, changes)
        .await?;
    session.commit().await?;
    Ok(Json(user.into()))
}

/// Activate or deactivate a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserStatusRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Cannot deactivate yourself", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user_status(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateUserStatusRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_role(&ctx, &[Role::Admin])?;
    if !request.is_active {
        not_self(&ctx, id, "deactivate")?;
    }

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .set_active(id, request.is_active)
        .await?;
    session.commit().await?;
    Ok(Json(user.into()))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete yourself", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_role(&ctx, &[Role::Admin])?;
    not_self(&ctx, id, "delete")?;

    let session = TenantSession::begin(&state.db, &ctx).await?;
    UserRepository::new(session.conn(), session.tenant())
        .delete(id)
        .await?;
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
