//! # Restaurant Handlers
//!
//! Public registration of new restaurants and the platform-staff directory
//! (listing, activation, status and KAM assignment).

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::types::{
    RestaurantResponse, UserResponse, email_field, optional_text, path_tenant, text_field,
};
use crate::auth::PlatformStaff;
use crate::error::ApiError;
use crate::models::restaurant::RestaurantStatus;
use crate::onboarding;
use crate::repositories::RestaurantRepository;
use crate::repositories::restaurant::NewRestaurant;
use crate::server::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRestaurantRequest {
    #[schema(example = "Bistro du Coin")]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "hello@bistro.example")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub contact_name: String,
    #[schema(example = "ada@bistro.example")]
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RestaurantListQuery {
    /// Only restaurants in this status
    pub status: Option<RestaurantStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRestaurantStatusRequest {
    pub status: RestaurantStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignKamRequest {
    pub kam_id: i64,
}

/// Activated restaurant plus its provisioned admin account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivationResponse {
    pub restaurant: RestaurantResponse,
    pub admin: UserResponse,
}

/// Register a restaurant; it stays pending until platform staff activate it
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/register",
    request_body = RegisterRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant registered as pending", body = RestaurantResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn register_restaurant(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRestaurantRequest>,
) -> Result<(StatusCode, Json<RestaurantResponse>), ApiError> {
    let new = NewRestaurant {
        name: text_field("name", &request.name, 255)?,
        description: optional_text(request.description),
        address: optional_text(request.address),
        phone: optional_text(request.phone),
        email: email_field("email", &request.email)?,
        contact_name: text_field("contact_name", &request.contact_name, 255)?,
        contact_email: email_field("contact_email", &request.contact_email)?,
        contact_phone: optional_text(request.contact_phone),
    };

    let restaurant = onboarding::register_restaurant(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(restaurant.into())))
}

/// List restaurants
#[utoipa::path(
    get,
    path = "/api/v1/restaurants",
    security(("bearer_auth" = [])),
    params(RestaurantListQuery),
    responses(
        (status = 200, description = "Restaurants, newest first", body = [RestaurantResponse]),
        (status = 403, description = "Platform staff only", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    PlatformStaff(_actor): PlatformStaff,
    ApiQuery(query): ApiQuery<RestaurantListQuery>,
) -> Result<Json<Vec<RestaurantResponse>>, ApiError> {
    let restaurants = RestaurantRepository::new(&state.db)
        .list(query.status)
        .await?;
    Ok(Json(restaurants.into_iter().map(Into::into).collect()))
}

/// List restaurants awaiting activation
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/pending",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending restaurants", body = [RestaurantResponse]),
        (status = 403, description = "Platform staff only", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn list_pending_restaurants(
    State(state): State<AppState>,
    PlatformStaff(_actor): PlatformStaff,
) -> Result<Json<Vec<RestaurantResponse>>, ApiError> {
    let restaurants = RestaurantRepository::new(&state.db)
        .list(Some(RestaurantStatus::Pending))
        .await?;
    Ok(Json(restaurants.into_iter().map(Into::into).collect()))
}

/// Get a restaurant
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant", body = RestaurantResponse),
        (status = 403, description = "Platform staff only", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    PlatformStaff(_actor): PlatformStaff,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    let restaurant = RestaurantRepository::new(&state.db)
        .get(path_tenant(id)?)
        .await?;
    Ok(Json(restaurant.into()))
}

/// Activate a pending restaurant and provision its admin user
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/activate",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant activated", body = ActivationResponse),
        (status = 403, description = "Platform staff only", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError),
        (status = 409, description = "Restaurant is not pending", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn activate_restaurant(
    State(state): State<AppState>,
    PlatformStaff(actor): PlatformStaff,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ActivationResponse>, ApiError> {
    let activation = onboarding::activate_restaurant(
        &state.db,
        &state.config,
        state.mailer.as_ref(),
        &actor,
        path_tenant(id)?,
    )
    .await?;
    Ok(Json(ActivationResponse {
        restaurant: activation.restaurant.into(),
        admin: activation.admin.into(),
    }))
}

/// Change the status of an onboarded restaurant
#[utoipa::path(
    patch,
    path = "/api/v1/restaurants/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Restaurant id")),
    request_body = UpdateRestaurantStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = RestaurantResponse),
        (status = 400, description = "Pending cannot be re-entered", body = ApiError),
        (status = 403, description = "Platform staff only, or platform organization", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError),
        (status = 409, description = "Pending restaurants must be activated", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn update_restaurant_status(
    State(state): State<AppState>,
    PlatformStaff(actor): PlatformStaff,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateRestaurantStatusRequest>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    let restaurant = onboarding::update_status(&state.db, path_tenant(id)?, request.status).await?;
    tracing::info!(restaurant_id = restaurant.id, changed_by = actor.user_id, "Status updated");
    Ok(Json(restaurant.into()))
}

/// Assign a key account manager
#[utoipa::path(
    put,
    path = "/api/v1/restaurants/{id}/assign-kam",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Restaurant id")),
    request_body = AssignKamRequest,
    responses(
        (status = 200, description = "KAM assigned", body = RestaurantResponse),
        (status = 400, description = "Not an active platform KAM", body = ApiError),
        (status = 403, description = "Platform staff only", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "platform"
)]
pub async fn assign_kam(
    State(state): State<AppState>,
    PlatformStaff(_actor): PlatformStaff,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<AssignKamRequest>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    let restaurant = onboarding::assign_kam(&state.db, path_tenant(id)?, request.kam_id).await?;
    Ok(Json(restaurant.into()))
}
