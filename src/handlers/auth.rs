//! # Authentication Handlers
//!
//! Login and public self-registration.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::extract::ApiJson;
use super::types::{UserResponse, email_field, optional_text, text_field};
use crate::error::{ApiError, conflict, forbidden, not_found, unauthorized, validation_error};
use crate::models::user;
use crate::password::{check_password_policy, hash_password, verify_password};
use crate::repositories::user::{NewUser, find_login_candidates};
use crate::repositories::{RestaurantRepository, UserRepository};
use crate::server::AppState;
use crate::tenancy::{Role, TenantId, TenantSession};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "chef@bistro.example")]
    pub email: String,
    pub password: String,
    /// Required when the same email is registered with several restaurants
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub restaurant_id: i64,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Only `Client` may be requested publicly
    pub role: Option<Role>,
}

/// Access token plus the authenticated user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

fn auth_response(state: &AppState, user: user::Model) -> Result<AuthResponse, ApiError> {
    let issued = state
        .jwt
        .issue(&user)
        .map_err(|err| anyhow::anyhow!("issuing access token: {err}"))?;
    Ok(AuthResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
        user: user.into(),
    })
}

fn login_rejected(outcome: &'static str, error: ApiError) -> ApiError {
    metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
    error
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ApiError),
        (status = 403, description = "Account or restaurant disabled", body = ApiError),
        (status = 409, description = "Email registered with several restaurants; restaurant_id required", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = email_field("email", &request.email)?;
    let restaurant = match request.restaurant_id {
        Some(id) => Some(
            TenantId::new(id)
                .map_err(|_| login_rejected("invalid", unauthorized(Some(INVALID_CREDENTIALS))))?,
        ),
        None => None,
    };

    let mut candidates = find_login_candidates(&state.db, &email, restaurant).await?;
    let user = match candidates.len() {
        0 => return Err(login_rejected("invalid", unauthorized(Some(INVALID_CREDENTIALS)))),
        1 => candidates.remove(0),
        _ => {
            return Err(login_rejected(
                "ambiguous",
                conflict("Email is registered with several restaurants; provide restaurant_id"),
            ));
        }
    };

    if !verify_password(&request.password, &user.password_hash).await {
        return Err(login_rejected("invalid", unauthorized(Some(INVALID_CREDENTIALS))));
    }
    if !user.is_active {
        return Err(login_rejected("disabled", forbidden(Some("Account is disabled"))));
    }

    let tenant = TenantId::new(user.restaurant_id)
        .map_err(|err| anyhow::anyhow!("user {} has no valid restaurant: {err}", user.id))?;
    let active = RestaurantRepository::new(&state.db)
        .find(tenant)
        .await?
        .is_some_and(|restaurant| restaurant.is_active());
    if !active {
        return Err(login_rejected(
            "restaurant_inactive",
            forbidden(Some("Restaurant is not active")),
        ));
    }

    metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
    tracing::info!(user_id = user.id, restaurant_id = %tenant, "User logged in");
    Ok(Json(auth_response(&state, user)?))
}

/// Self-register as a client of an active restaurant
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Requested role cannot be self-assigned", body = ApiError),
        (status = 404, description = "Restaurant not found or not active", body = ApiError),
        (status = 409, description = "Email already registered with this restaurant", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if request.role.is_some_and(|role| role != Role::Client) {
        return Err(forbidden(Some("Only the Client role can be self-registered")));
    }
    let email = email_field("email", &request.email)?;
    let first_name = text_field("first_name", &request.first_name, 100)?;
    let last_name = text_field("last_name", &request.last_name, 100)?;
    check_password_policy(&request.password)
        .map_err(|message| validation_error(&message, json!({ "field": "password" })))?;
    let tenant = TenantId::new(request.restaurant_id).map_err(|_| not_found("restaurant"))?;

    let password_hash = hash_password(&request.password, state.config.password_hash_cost).await?;

    let session = TenantSession::begin_for(&state.db, tenant, Role::Client).await?;
    RestaurantRepository::new(session.conn())
        .find_active(tenant)
        .await?
        .ok_or_else(|| not_found("restaurant"))?;
    let user = UserRepository::new(session.conn(), tenant)
        .create(NewUser {
            email,
            password_hash,
            first_name,
            last_name,
            role: Role::Client,
            is_platform_staff: false,
            phone: optional_text(request.phone),
        })
        .await?;
    session.commit().await?;

    tracing::info!(user_id = user.id, restaurant_id = %tenant, "Client registered");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}
