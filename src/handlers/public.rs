//! # Public Handlers
//!
//! Unauthenticated menu browsing and guest booking. The restaurant is taken
//! from the path and must be active; every query runs in a guest session
//! bound to it.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::types::{
    CategoryResponse, MenuItemResponse, PublicRestaurantResponse, ReservationResponse,
    email_field, optional_text, path_tenant, text_field,
};
use crate::error::{ApiError, not_found};
use crate::repositories::menu_item::MenuItemFilter;
use crate::repositories::reservation::{Booker, NewReservation};
use crate::repositories::{
    MenuCategoryRepository, MenuItemRepository, ReservationRepository, RestaurantRepository,
};
use crate::server::AppState;
use crate::tenancy::{TenantId, TenantSession};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PublicMenuQuery {
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestReservationRequest {
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub table_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub number_of_guests: i32,
    pub notes: Option<String>,
}

/// Opens a guest session for an active restaurant; anything else is a 404.
async fn guest_session(state: &AppState, restaurant_id: i64) -> Result<TenantSession, ApiError> {
    let tenant: TenantId = path_tenant(restaurant_id)?;
    let session = TenantSession::begin_guest(&state.db, tenant).await?;
    RestaurantRepository::new(session.conn())
        .find_active(tenant)
        .await?
        .ok_or_else(|| not_found("restaurant"))?;
    Ok(session)
}

/// Basic information about an active restaurant
#[utoipa::path(
    get,
    path = "/api/v1/public/restaurants/{id}",
    params(("id" = i64, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant", body = PublicRestaurantResponse),
        (status = 404, description = "Restaurant not found or not active", body = ApiError)
    ),
    tag = "public"
)]
pub async fn get_public_restaurant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PublicRestaurantResponse>, ApiError> {
    let restaurant = RestaurantRepository::new(&state.db)
        .find_active(path_tenant(id)?)
        .await?
        .ok_or_else(|| not_found("restaurant"))?;
    Ok(Json(restaurant.into()))
}

/// Active categories of a restaurant's menu
#[utoipa::path(
    get,
    path = "/api/v1/public/restaurants/{id}/categories",
    params(("id" = i64, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Active categories", body = [CategoryResponse]),
        (status = 404, description = "Restaurant not found or not active", body = ApiError)
    ),
    tag = "public"
)]
pub async fn list_public_categories(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let session = guest_session(&state, id).await?;
    let categories = MenuCategoryRepository::new(session.conn(), session.tenant())
        .list(true)
        .await?;
    session.commit().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Available menu items of a restaurant
#[utoipa::path(
    get,
    path = "/api/v1/public/restaurants/{id}/menu-items",
    params(("id" = i64, Path, description = "Restaurant id"), PublicMenuQuery),
    responses(
        (status = 200, description = "Available menu items", body = [MenuItemResponse]),
        (status = 404, description = "Restaurant not found or not active", body = ApiError)
    ),
    tag = "public"
)]
pub async fn list_public_menu_items(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PublicMenuQuery>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let session = guest_session(&state, id).await?;
    let items = MenuItemRepository::new(session.conn(), session.tenant())
        .list(MenuItemFilter {
            category_id: query.category_id,
            available_only: true,
        })
        .await?;
    session.commit().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// One available menu item
#[utoipa::path(
    get,
    path = "/api/v1/public/restaurants/{id}/menu-items/{item_id}",
    params(
        ("id" = i64, Path, description = "Restaurant id"),
        ("item_id" = i64, Path, description = "Menu item id")
    ),
    responses(
        (status = 200, description = "Menu item", body = MenuItemResponse),
        (status = 404, description = "Restaurant or item not found", body = ApiError)
    ),
    tag = "public"
)]
pub async fn get_public_menu_item(
    State(state): State<AppState>,
    ApiPath((id, item_id)): ApiPath<(i64, i64)>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let session = guest_session(&state, id).await?;
    let item = MenuItemRepository::new(session.conn(), session.tenant())
        .find(item_id)
        .await?
        .filter(|item| item.is_available)
        .ok_or_else(|| not_found("menu item"))?;
    session.commit().await?;
    Ok(Json(item.into()))
}

/// Book a table as a guest
#[utoipa::path(
    post,
    path = "/api/v1/public/restaurants/{id}/reservations",
    params(("id" = i64, Path, description = "Restaurant id")),
    request_body = GuestReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Restaurant not found or not active", body = ApiError),
        (status = 409, description = "Table already booked for that time", body = ApiError)
    ),
    tag = "public"
)]
pub async fn create_guest_reservation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<GuestReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let booker = Booker::Guest {
        name: text_field("guest_name", &request.guest_name, 255)?,
        email: email_field("guest_email", &request.guest_email)?,
        phone: optional_text(request.guest_phone),
    };

    let session = guest_session(&state, id).await?;
    let reservation = ReservationRepository::new(session.conn(), session.tenant())
        .create(NewReservation {
            booker,
            table_number: request.table_number,
            start_time: request.start_time.into(),
            end_time: request.end_time.into(),
            number_of_guests: request.number_of_guests,
            notes: optional_text(request.notes),
        })
        .await?;
    session.commit().await?;

    tracing::info!(
        reservation_id = reservation.id,
        restaurant_id = reservation.restaurant_id,
        "Guest reservation created"
    );
    Ok((StatusCode::CREATED, Json(reservation.into())))
}
