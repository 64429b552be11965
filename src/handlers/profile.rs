//! # Profile Handlers
//!
//! Self-service on the caller's own account. Every operation targets the
//! user id from the token inside the caller's restaurant; there is no way to
//! name another user here.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use super::extract::ApiJson;
use super::types::{UserResponse, optional_text, text_field};
use crate::error::{ApiError, validation_error};
use crate::password::{check_password_policy, hash_password, verify_password};
use crate::repositories::UserRepository;
use crate::repositories::user::UserChanges;
use crate::server::AppState;
use crate::tenancy::{TenantContext, TenantSession};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Europe/Rome")]
    pub timezone: Option<String>,
    #[schema(example = "it")]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    /// Arbitrary JSON object, stored as given.
    #[schema(value_type = Object)]
    pub preferences: serde_json::Value,
}

/// The authenticated user's own account
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "User no longer exists", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<UserResponse>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .get(ctx.user_id)
        .await?;
    session.commit().await?;
    Ok(Json(user.into()))
}

/// Update the caller's name, phone, timezone or language
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
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
        role: None,
        timezone: optional_text(request.timezone),
        language: optional_text(request.language),
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .update(ctx.user_id, changes)
        .await?;
    session.commit().await?;
    Ok(Json(user.into()))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/api/v1/profile/password",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Current password incorrect or new password too weak", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn change_password(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    check_password_policy(&request.new_password)
        .map_err(|message| validation_error(&message, json!({ "field": "new_password" })))?;

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let users = UserRepository::new(session.conn(), session.tenant());
    let user = users.get(ctx.user_id).await?;
    if !verify_password(&request.current_password, &user.password_hash).await {
        return Err(validation_error(
            "current password is incorrect",
            json!({ "field": "current_password" }),
        ));
    }

    let password_hash =
        hash_password(&request.new_password, state.config.password_hash_cost).await?;
    users.set_password_hash(user.id, password_hash).await?;
    session.commit().await?;

    tracing::info!(user_id = ctx.user_id, restaurant_id = %ctx.restaurant_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the caller's preferences document
#[utoipa::path(
    put,
    path = "/api/v1/profile/preferences",
    security(("bearer_auth" = [])),
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences stored", body = UserResponse),
        (status = 400, description = "Preferences must be a JSON object", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "profile"
)]
pub async fn update_preferences(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<UpdatePreferencesRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if !request.preferences.is_object() {
        return Err(validation_error(
            "preferences must be a JSON object",
            json!({ "field": "preferences" }),
        ));
    }

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let user = UserRepository::new(session.conn(), session.tenant())
        .set_preferences(ctx.user_id, request.preferences)
        .await?;
    session.commit().await?;
    Ok(Json(user.into()))
}
