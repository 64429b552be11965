//! Platform organization bootstrap
//!
//! Creates the reserved platform organization (restaurant id 1) and the first
//! platform administrator. Both steps are skipped when their rows already
//! exist, so the bootstrap is safe to run on every start.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, Set, Statement,
};
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::RepositoryError;
use crate::models::restaurant::{self, RestaurantStatus};
use crate::password::{PasswordError, hash_password};
use crate::repositories::user::NewUser;
use crate::repositories::{RestaurantRepository, UserRepository};
use crate::tenancy::{PLATFORM_ORGANIZATION_ID, Role};
use crate::validation::normalize_email;

const PLATFORM_ORGANIZATION_NAME: &str = "Platform Organization";
const PLATFORM_ORGANIZATION_EMAIL: &str = "platform@system.local";

/// Password used for the first administrator outside production when none is
/// configured.
pub const DEVELOPMENT_ADMIN_PASSWORD: &str = "ChangeMe123!";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("BOOTSTRAP_ADMIN_PASSWORD is required in production")]
    MissingAdminPassword,
    #[error("platform organization (restaurant {0}) is missing")]
    SentinelMissing(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// What a bootstrap run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub sentinel_created: bool,
    pub admin_created: bool,
}

/// Seeds the platform organization and the initial platform administrator.
pub async fn bootstrap_platform(
    db: &DatabaseConnection,
    config: &AppConfig,
) -> Result<BootstrapReport, BootstrapError> {
    let mut report = BootstrapReport::default();

    let restaurants = RestaurantRepository::new(db);
    if restaurants.exists(PLATFORM_ORGANIZATION_ID).await? {
        log::info!("Platform organization already exists");
    } else {
        insert_sentinel(db).await?;
        report.sentinel_created = true;
        log::info!("Platform organization created");
    }
    sync_restaurant_sequence(db).await?;

    let users = UserRepository::new(db, PLATFORM_ORGANIZATION_ID);
    if users.count_with_role(Role::Kam).await? > 0 {
        log::info!("Platform administrator already exists");
    } else {
        let email = normalize_email(&config.bootstrap.admin_email);
        let password = admin_password(config)?;
        let password_hash = hash_password(&password, config.password_hash_cost).await?;
        users
            .create(NewUser {
                email: email.clone(),
                password_hash,
                first_name: "Platform".to_string(),
                last_name: "Administrator".to_string(),
                role: Role::Kam,
                is_platform_staff: true,
                phone: None,
            })
            .await?;
        report.admin_created = true;
        log::info!("Platform administrator created: {}", email);
    }

    ensure_sentinel(db).await?;
    metrics::counter!("platform_bootstrap_total").increment(1);
    Ok(report)
}

/// Fails unless the platform organization row exists.
pub async fn ensure_sentinel<C: ConnectionTrait>(db: &C) -> Result<(), BootstrapError> {
    if RestaurantRepository::new(db)
        .exists(PLATFORM_ORGANIZATION_ID)
        .await?
    {
        Ok(())
    } else {
        Err(BootstrapError::SentinelMissing(PLATFORM_ORGANIZATION_ID.get()))
    }
}

fn admin_password(config: &AppConfig) -> Result<String, BootstrapError> {
    match config.bootstrap.admin_password.as_deref() {
        Some(password) if !password.is_empty() => Ok(password.to_string()),
        _ if config.is_production() => Err(BootstrapError::MissingAdminPassword),
        _ => {
            log::warn!(
                "BOOTSTRAP_ADMIN_PASSWORD not set; using the development default password. Change it immediately."
            );
            Ok(DEVELOPMENT_ADMIN_PASSWORD.to_string())
        }
    }
}

async fn insert_sentinel(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = Utc::now().into();
    restaurant::ActiveModel {
        id: Set(PLATFORM_ORGANIZATION_ID.get()),
        name: Set(PLATFORM_ORGANIZATION_NAME.to_string()),
        description: Set(Some(
            "Platform-level organization for key account managers and administrators"
                .to_string(),
        )),
        address: Set(None),
        phone: Set(None),
        email: Set(PLATFORM_ORGANIZATION_EMAIL.to_string()),
        status: Set(RestaurantStatus::Active.as_str().to_string()),
        kam_id: Set(None),
        activated_by: Set(None),
        activated_at: Set(Some(now)),
        contact_name: Set(PLATFORM_ORGANIZATION_NAME.to_string()),
        contact_email: Set(PLATFORM_ORGANIZATION_EMAIL.to_string()),
        contact_phone: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Moves the restaurants id sequence past explicitly inserted ids so the next
/// registration never collides with the platform organization.
async fn sync_restaurant_sequence(db: &DatabaseConnection) -> Result<(), DbErr> {
    if db.get_database_backend() != DatabaseBackend::Postgres {
        return Ok(());
    }
    db.execute(Statement::from_string(
        DatabaseBackend::Postgres,
        "SELECT setval(pg_get_serial_sequence('restaurants', 'id'), \
         GREATEST((SELECT COALESCE(MAX(id), 0) FROM restaurants), 1), true)",
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(profile: &str, password: Option<&str>) -> AppConfig {
        let mut config = AppConfig {
            profile: profile.to_string(),
            ..AppConfig::default()
        };
        config.bootstrap.admin_password = password.map(str::to_string);
        config
    }

    #[test]
    fn production_requires_admin_password() {
        assert!(matches!(
            admin_password(&config("production", None)),
            Err(BootstrapError::MissingAdminPassword)
        ));
        assert!(matches!(
            admin_password(&config("production", Some(""))),
            Err(BootstrapError::MissingAdminPassword)
        ));
    }

    #[test]
    fn development_falls_back_to_default_password() {
        assert_eq!(
            admin_password(&config("local", None)).unwrap(),
            DEVELOPMENT_ADMIN_PASSWORD
        );
        assert_eq!(
            admin_password(&config("production", Some("s3cret-pass"))).unwrap(),
            "s3cret-pass"
        );
    }
}
