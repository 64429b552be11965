//! # Platform Staff Handlers
//!
//! Key account managers live under the platform organization and carry the
//! platform capability.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use super::extract::ApiJson;
use super::types::{UserResponse, email_field, optional_text, text_field};
use crate::auth::PlatformStaff;
use crate::error::{ApiError, validation_error};
use crate::password::{check_password_policy, hash_password};
use crate::repositories::UserRepository;
use crate::repositories::user::NewUser;
use crate::server::AppState;
use crate::tenancy::{PLATFORM_ORGANIZATION_ID, Role, TenantSession};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateKamRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Create a key account manager
#[utoipa::path(
    post,
    path = "/api/v1/platform/kams",
    security(("bearer_auth" = [])),
    request_body = CreateKamRequest,
    responses(
        (status = 201, description = "KAM created", body = UserResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Platform staff only", body = ApiError),
        (status = 409, description = "Email already used by platform staff", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn create_kam(
    State(state): State<AppState>,
    PlatformStaff(actor): PlatformStaff,
    ApiJson(request): ApiJson<CreateKamRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let email = email_field("email", &request.email)?;
    let first_name = text_field("first_name", &request.first_name, 100)?;
    let last_name = text_field("last_name", &request.last_name, 100)?;
    check_password_policy(&request.password)
        .map_err(|message| validation_error(&message, json!({ "field": "password" })))?;
    let password_hash = hash_password(&request.password, state.config.password_hash_cost).await?;

    let session = TenantSession::begin_for(&state.db, PLATFORM_ORGANIZATION_ID, actor.role).await?;
    let kam = UserRepository::new(session.conn(), session.tenant())
        .create(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
            role: Role::Kam,
            is_platform_staff: true,
            phone: optional_text(request.phone),
        })
        .await?;
    session.commit().await?;

    tracing::info!(kam_id = kam.id, created_by = actor.user_id, "KAM created");
    Ok((StatusCode::CREATED, Json(kam.into())))
}

/// List key account managers
#[utoipa::path(
    get,
    path = "/api/v1/platform/kams",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "KAMs", body = [UserResponse]),
        (status = 403, description = "Platform staff only", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn list_kams(
    State(state): State<AppState>,
    PlatformStaff(actor): PlatformStaff,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let session = TenantSession::begin_for(&state.db, PLATFORM_ORGANIZATION_ID, actor.role).await?;
    let kams = UserRepository::new(session.conn(), session.tenant())
        .list_platform_kams()
        .await?;
    session.commit().await?;
    Ok(Json(kams.into_iter().map(Into::into).collect()))
}
