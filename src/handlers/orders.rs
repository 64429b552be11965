//! # Order Handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use super::types::{OrderResponse, optional_text};
use crate::auth::require_role;
use crate::error::{ApiError, not_found};
use crate::models::order::OrderStatus;
use crate::repositories::OrderRepository;
use crate::repositories::order::{NewOrder, NewOrderLine};
use crate::server::AppState;
use crate::tenancy::{Role, TenantContext, TenantSession};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub menu_item_id: i64,
    #[schema(example = 2)]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

fn own_orders(ctx: &TenantContext) -> Option<i64> {
    (ctx.role == Role::Client).then_some(ctx.user_id)
}

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders without line items", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    ctx: TenantContext,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let orders = OrderRepository::new(session.conn(), session.tenant())
        .list(own_orders(&ctx))
        .await?;
    session.commit().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Get an order with its line items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let order = OrderRepository::new(session.conn(), session.tenant())
        .get_with_items(id)
        .await?;
    session.commit().await?;

    if own_orders(&ctx).is_some_and(|user_id| order.order.user_id != Some(user_id)) {
        return Err(not_found("order"));
    }
    Ok(Json(order.into()))
}

/// Place an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty order, bad quantity or unavailable item", body = ApiError),
        (status = 404, description = "Menu item not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let new = NewOrder {
        user_id: Some(ctx.user_id),
        notes: optional_text(request.notes),
        lines: request
            .items
            .into_iter()
            .map(|line| NewOrderLine {
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                notes: optional_text(line.notes),
            })
            .collect(),
    };

    let session = TenantSession::begin(&state.db, &ctx).await?;
    let order = OrderRepository::new(session.conn(), session.tenant())
        .create(new)
        .await?;
    session.commit().await?;

    tracing::info!(
        order_id = order.order.id,
        restaurant_id = order.order.restaurant_id,
        total_cents = order.order.total_cents,
        "Order placed"
    );
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// Move an order to another status
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 403, description = "Admin or Staff role required", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError),
        (status = 409, description = "Order already completed or cancelled", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    ctx: TenantContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    require_role(&ctx, &[Role::Admin, Role::Staff])?;
    let session = TenantSession::begin(&state.db, &ctx).await?;
    let order = OrderRepository::new(session.conn(), session.tenant())
        .update_status(id, request.status)
        .await?;
    session.commit().await?;
    Ok(Json(order.into()))
}
