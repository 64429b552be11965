//! Test utilities for database and router testing.
//!
//! Every database is an in-memory SQLite instance with all migrations applied
//! and the platform organization bootstrapped, so restaurants created by a
//! test always get ids above 1.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

use restaurant_platform::config::AppConfig;
use restaurant_platform::mail::{MailError, Mailer, TemplatedEmail};
use restaurant_platform::models::restaurant::{self, RestaurantStatus};
use restaurant_platform::models::{menu_category, menu_item, user};
use restaurant_platform::password::hash_password;
use restaurant_platform::repositories::menu_category::NewCategory;
use restaurant_platform::repositories::menu_item::NewMenuItem;
use restaurant_platform::repositories::user::NewUser;
use restaurant_platform::repositories::{
    MenuCategoryRepository, MenuItemRepository, UserRepository,
};
use restaurant_platform::seeds::bootstrap_platform;
use restaurant_platform::server::{AppState, create_app};
use restaurant_platform::tenancy::{Role, TenantId};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-integration-test";
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "Sup3rSecret!";
#[allow(dead_code)]
pub const PLATFORM_ADMIN_EMAIL: &str = "admin@platform.test";
#[allow(dead_code)]
pub const PLATFORM_ADMIN_PASSWORD: &str = "PlatformPass1!";

/// Configuration for tests: fast bcrypt and a fixed signing secret.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        password_hash_cost: 4,
        ..AppConfig::default()
    };
    config.bootstrap.admin_email = PLATFORM_ADMIN_EMAIL.to_string();
    config.bootstrap.admin_password = Some(PLATFORM_ADMIN_PASSWORD.to_string());
    config
}

/// In-memory SQLite database with migrations applied and nothing seeded.
#[allow(dead_code)]
pub async fn setup_bare_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// In-memory SQLite database with migrations applied and the platform
/// organization plus its first administrator seeded.
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = setup_bare_db().await?;
    bootstrap_platform(&db, &test_config()).await?;
    Ok(db)
}

#[allow(dead_code)]
pub fn test_state(db: DatabaseConnection) -> AppState {
    AppState::new(test_config(), db)
}

#[allow(dead_code)]
pub fn test_app(db: DatabaseConnection) -> Router {
    create_app(test_state(db))
}

fn tenant(restaurant_id: i64) -> Result<TenantId> {
    Ok(TenantId::new(restaurant_id)?)
}

/// Inserts a restaurant directly with the given status.
#[allow(dead_code)]
pub async fn create_restaurant(
    db: &DatabaseConnection,
    slug: &str,
    status: RestaurantStatus,
) -> Result<restaurant::Model> {
    let now = Utc::now().into();
    let model = restaurant::ActiveModel {
        name: Set(format!("Restaurant {slug}")),
        description: Set(None),
        address: Set(Some(format!("1 {slug} Street"))),
        phone: Set(None),
        email: Set(format!("{slug}@restaurants.test")),
        status: Set(status.as_str().to_string()),
        kam_id: Set(None),
        activated_by: Set(None),
        activated_at: Set(None),
        contact_name: Set(format!("Owner {slug}")),
        contact_email: Set(format!("owner@{slug}.test")),
        contact_phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Creates a user whose password is [`TEST_PASSWORD`].
#[allow(dead_code)]
pub async fn create_user(
    db: &DatabaseConnection,
    restaurant_id: i64,
    email: &str,
    role: Role,
) -> Result<user::Model> {
    let password_hash = hash_password(TEST_PASSWORD, 4).await?;
    let user = UserRepository::new(db, tenant(restaurant_id)?)
        .create(NewUser {
            email: email.to_string(),
            password_hash,
            first_name: "Test".to_string(),
            last_name: role.as_str().to_string(),
            role,
            is_platform_staff: false,
            phone: None,
        })
        .await?;
    Ok(user)
}

/// Creates a platform key account manager under the platform organization.
#[allow(dead_code)]
pub async fn create_platform_kam(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    let password_hash = hash_password(TEST_PASSWORD, 4).await?;
    let user = UserRepository::new(db, tenant(1)?)
        .create(NewUser {
            email: email.to_string(),
            password_hash,
            first_name: "Key".to_string(),
            last_name: "Manager".to_string(),
            role: Role::Kam,
            is_platform_staff: true,
            phone: None,
        })
        .await?;
    Ok(user)
}

#[allow(dead_code)]
pub async fn create_category(
    db: &DatabaseConnection,
    restaurant_id: i64,
    name: &str,
) -> Result<menu_category::Model> {
    let category = MenuCategoryRepository::new(db, tenant(restaurant_id)?)
        .create(NewCategory {
            name: name.to_string(),
            description: None,
            display_order: 0,
            is_active: true,
        })
        .await?;
    Ok(category)
}

#[allow(dead_code)]
pub async fn create_menu_item(
    db: &DatabaseConnection,
    restaurant_id: i64,
    category_id: i64,
    name: &str,
    price_cents: i64,
) -> Result<menu_item::Model> {
    let item = MenuItemRepository::new(db, tenant(restaurant_id)?)
        .create(NewMenuItem {
            category_id,
            name: name.to_string(),
            description: Some(format!("{name} description")),
            price_cents,
            image_url: None,
            display_order: 0,
            is_available: true,
        })
        .await?;
    Ok(item)
}

/// Signed access token for `user`.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user: &user::Model) -> Result<String> {
    Ok(state.jwt.issue(user)?.token)
}

/// Builds a request, optionally authenticated and with a JSON body.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Authenticated request carrying `body` verbatim as JSON.
#[allow(dead_code)]
pub fn raw_json_request(method: Method, uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Sends `request` through `app` and returns the status and JSON body
/// (`Value::Null` for empty bodies).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Mailer that keeps every email instead of sending it.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<TemplatedEmail>>,
    fail: bool,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<TemplatedEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_template(&self, email: &TemplatedEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(MailError::Rejected {
                status: 503,
                body: "mail provider unavailable".to_string(),
            });
        }
        Ok(())
    }
}
