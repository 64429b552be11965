//! # Reservation Handlers
//!
//! Clients see and manage only their own reservations; Admin and Staff see
//! every reservation of the restaurant.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use super::types::{ReservationResponse, optional_text};
use crate::auth::require_role;
use crate::error::{ApiError, forbidden, not_found};
use crate::models::reservation::ReservationStatus;
use crate::repositories::ReservationRepository;
use crate::repositories::reservation::{Booker, NewReservation, ReservationChanges};
use crate::server::AppState;
use crate::tenancy::{Role, TenantContext, TenantSession};

const FRONT_OF_HOUSE: &[Role] = &[Role::Admin, Role::Staff];

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    pub table_number: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[schema(example = 4)]
    pub number_of_guests: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReservationRequest {
    pub status: Option<ReservationStatus>,
    pub notes: Option<String>,
}

/// Clients are limited to their own bookings.
fn own_bookings(ctx: &TenantContext) -> Option<i64> {
    (ctx.role == Role::Client).then_some(ctx.user_id)
}

/// List reservations
#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reservations ordered by start time", body = [ReservationResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let reservations = ReservationRepository::new(session.conn(), session.tenant())
        .list(own_bookings(&ctx))
        .await?;
    session.commit().await?;
    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

/// Get a reservation
#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation", body = ReservationResponse),
        (status = 404, description = "Reservation not found", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let reservation = ReservationRepository::new(session.conn(), session.tenant())
        .get(id)
        .await?;
    session.commit().await?;

    if own_bookings(&ctx).is_some_and(|user_id| reservation.user_id != Some(user_id)) {
        return Err(not_found("reservation"));
    }
    Ok(Json(reservation.into()))
}

/// Book a table for the authenticated user
#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 400, description = "Invalid time range or guest count", body = ApiError),
        (status = 409, description = "Table already booked for that time", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let reservation = ReservationRepository::new(session.conn(), session.tenant())
        .create(NewReservation {
            booker: Booker::User(ctx.user_id),
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
        table = reservation.table_number,
        "Reservation created"
    );
    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// Update status or notes of a reservation
///
/// Clients may only cancel or annotate their own reservations.
#[utoipa::path(
    put,
    path = "/api/v1/reservations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Reservation id")),
    request_body = UpdateReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = ReservationResponse),
        (status = 403, description = "Status change not allowed for this role", body = ApiError),
        (status = 404, description = "Reservation not found", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn update_reservation(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateReservationRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let reservations = ReservationRepository::new(session.conn(), session.tenant());

    if let Some(user_id) = own_bookings(&ctx) {
        let existing = reservations.get(id).await?;
        if existing.user_id != Some(user_id) {
            return Err(not_found("reservation"));
        }
        if request
            .status
            .is_some_and(|status| status != ReservationStatus::Cancelled)
        {
            return Err(forbidden(Some("Clients may only cancel reservations")));
        }
    }

    let reservation = reservations
        .update(
            id,
            ReservationChanges {
                status: request.status,
                notes: request.notes,
            },
        )
        .await?;
    session.commit().await?;
    Ok(Json(reservation.into()))
}

/// Delete a reservation
#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Reservation id")),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Reservation not found", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn delete_reservation(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_role(&ctx, FRONT_OF_HOUSE)?;
    let session = TenantSession::begin(&state.db, &ctx).await?;
    ReservationRepository::new(session.conn(), session.tenant())
        .delete(id)
        .await?;
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
