//! # Server Configuration
//!
//! Router assembly, shared state and the OpenAPI document for the Restaurant
//! Platform API.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{
    self, auth, categories, menu_items, orders, platform, profile, public, reservations,
    restaurants, users,
};
use crate::mail::{Mailer, mailer_from_config};
use crate::telemetry::{TRACE_ID_HEADER, trace_context_middleware};
use crate::tokens::JwtKeys;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub jwt: Arc<JwtKeys>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Builds the state from configuration, choosing the mailer from the
    /// configured provider key.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let jwt = Arc::new(JwtKeys::from_config(&config));
        let mailer = mailer_from_config(&config.mail);
        Self {
            config: Arc::new(config),
            db,
            jwt,
            mailer,
        }
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/restaurants/register", post(restaurants::register_restaurant))
        .route(
            "/public/restaurants/{id}",
            get(public::get_public_restaurant),
        )
        .route(
            "/public/restaurants/{id}/categories",
            get(public::list_public_categories),
        )
        .route(
            "/public/restaurants/{id}/menu-items",
            get(public::list_public_menu_items),
        )
        .route(
            "/public/restaurants/{id}/menu-items/{item_id}",
            get(public::get_public_menu_item),
        )
        .route(
            "/public/restaurants/{id}/reservations",
            post(public::create_guest_reservation),
        )
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/profile/password", put(profile::change_password))
        .route("/profile/preferences", put(profile::update_preferences))
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/menu-items",
            get(menu_items::list_menu_items).post(menu_items::create_menu_item),
        )
        .route(
            "/menu-items/{id}",
            get(menu_items::get_menu_item)
                .put(menu_items::update_menu_item)
                .delete(menu_items::delete_menu_item),
        )
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(reservations::get_reservation)
                .put(reservations::update_reservation)
                .delete(reservations::delete_reservation),
        )
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", patch(orders::update_order_status))
        .route(
            "/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/status", patch(users::update_user_status))
        .route("/restaurants", get(restaurants::list_restaurants))
        .route(
            "/restaurants/pending",
            get(restaurants::list_pending_restaurants),
        )
        .route("/restaurants/{id}", get(restaurants::get_restaurant))
        .route(
            "/restaurants/{id}/activate",
            post(restaurants::activate_restaurant),
        )
        .route(
            "/restaurants/{id}/status",
            patch(restaurants::update_restaurant_status),
        )
        .route(
            "/restaurants/{id}/assign-kam",
            put(restaurants::assign_kam),
        )
        .route(
            "/platform/kams",
            get(platform::list_kams).post(platform::create_kam),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, TRACE_ID_HEADER])
        .expose_headers([TRACE_ID_HEADER]);

    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = protected_routes().route_layer(middleware::from_fn_with_state(
        state.jwt.clone(),
        auth_middleware,
    ));
    let api_v1 = public_routes().merge(protected);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_v1)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();
    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health,
        auth::login,
        auth::register,
        profile::get_profile,
        profile::update_profile,
        profile::change_password,
        profile::update_preferences,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        menu_items::list_menu_items,
        menu_items::get_menu_item,
        menu_items::create_menu_item,
        menu_items::update_menu_item,
        menu_items::delete_menu_item,
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::create_reservation,
        reservations::update_reservation,
        reservations::delete_reservation,
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order_status,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::update_user_status,
        users::delete_user,
        restaurants::register_restaurant,
        restaurants::list_restaurants,
        restaurants::list_pending_restaurants,
        restaurants::get_restaurant,
        restaurants::activate_restaurant,
        restaurants::update_restaurant_status,
        restaurants::assign_kam,
        platform::create_kam,
        platform::list_kams,
        public::get_public_restaurant,
        public::list_public_categories,
        public::list_public_menu_items,
        public::get_public_menu_item,
        public::create_guest_reservation,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::tenancy::Role,
            crate::models::restaurant::RestaurantStatus,
            crate::models::reservation::ReservationStatus,
            crate::models::order::OrderStatus,
            handlers::HealthResponse,
            handlers::types::UserResponse,
            handlers::types::RestaurantResponse,
            handlers::types::PublicRestaurantResponse,
            handlers::types::CategoryResponse,
            handlers::types::MenuItemResponse,
            handlers::types::ReservationResponse,
            handlers::types::OrderResponse,
            handlers::types::OrderItemResponse,
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::AuthResponse,
            categories::CreateCategoryRequest,
            categories::UpdateCategoryRequest,
            menu_items::CreateMenuItemRequest,
            menu_items::UpdateMenuItemRequest,
            reservations::CreateReservationRequest,
            reservations::UpdateReservationRequest,
            orders::CreateOrderRequest,
            orders::OrderLineRequest,
            orders::UpdateOrderStatusRequest,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            profile::UpdateProfileRequest,
            profile::ChangePasswordRequest,
            profile::UpdatePreferencesRequest,
            users::UpdateUserStatusRequest,
            restaurants::RegisterRestaurantRequest,
            restaurants::UpdateRestaurantStatusRequest,
            restaurants::AssignKamRequest,
            restaurants::ActivationResponse,
            platform::CreateKamRequest,
            public::GuestReservationRequest,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "auth", description = "Login and self-registration"),
        (name = "menu", description = "Menu categories and items"),
        (name = "reservations", description = "Table reservations"),
        (name = "orders", description = "Orders"),
        (name = "users", description = "Restaurant user management"),
        (name = "profile", description = "Current user"),
        (name = "restaurants", description = "Restaurant registration"),
        (name = "platform", description = "Platform staff operations"),
        (name = "public", description = "Public menu and guest booking")
    ),
    info(
        title = "Restaurant Platform API",
        description = "Multi-tenant restaurant management API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
