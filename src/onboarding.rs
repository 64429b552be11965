//! # Restaurant Onboarding
//!
//! Registration, activation and lifecycle management of tenants.
//!
//! A restaurant registers itself as `pending`. Only a platform actor can move
//! it to `active`, and doing so provisions the restaurant's first Admin user
//! inside the new tenant. After activation platform staff may switch between
//! `active`, `inactive` and `suspended`; `pending` is never re-entered and the
//! platform organization itself never changes status.

use axum::http::StatusCode;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::{ApiError, RepositoryError};
use crate::mail::{Mailer, welcome_email};
use crate::models::restaurant::{self, RestaurantStatus};
use crate::models::user;
use crate::password::{PasswordError, generate_temporary_password, hash_password};
use crate::repositories::restaurant::NewRestaurant;
use crate::repositories::user::NewUser;
use crate::repositories::{RestaurantRepository, UserRepository};
use crate::tenancy::{PLATFORM_ORGANIZATION_ID, Role, TenantContext, TenantId, TenantSession};

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("restaurant not found")]
    NotFound,
    #[error("the platform organization cannot be modified")]
    PlatformOrganization,
    #[error("restaurant is already {0}")]
    NotPending(String),
    #[error("an admin user with this email already exists for the restaurant")]
    AdminExists,
    #[error("restaurants leave pending only through activation")]
    ActivationRequired,
    #[error("a restaurant cannot return to pending")]
    PendingNotAllowed,
    #[error("user {0} is not an active platform key account manager")]
    InvalidKam(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<DbErr> for OnboardingError {
    fn from(error: DbErr) -> Self {
        Self::Repository(error.into())
    }
}

impl From<OnboardingError> for ApiError {
    fn from(error: OnboardingError) -> Self {
        let message = error.to_string();
        match error {
            OnboardingError::NotFound => crate::error::not_found("restaurant"),
            OnboardingError::PlatformOrganization => {
                ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
            }
            OnboardingError::NotPending(_)
            | OnboardingError::AdminExists
            | OnboardingError::ActivationRequired => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", message)
            }
            OnboardingError::PendingNotAllowed | OnboardingError::InvalidKam(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
            }
            OnboardingError::Repository(RepositoryError::NotFound(_)) => {
                crate::error::not_found("restaurant")
            }
            OnboardingError::Repository(inner) => inner.into(),
            OnboardingError::Password(inner) => inner.into(),
        }
    }
}

/// Result of a successful activation.
#[derive(Debug, Clone)]
pub struct Activation {
    pub restaurant: restaurant::Model,
    pub admin: user::Model,
}

/// Registers a new restaurant in the `pending` state.
pub async fn register_restaurant(
    db: &DatabaseConnection,
    new: NewRestaurant,
) -> Result<restaurant::Model, OnboardingError> {
    let restaurant = RestaurantRepository::new(db).create_pending(new).await?;
    tracing::info!(
        restaurant_id = restaurant.id,
        name = %restaurant.name,
        "Restaurant registered, awaiting activation"
    );
    metrics::counter!("restaurant_registrations_total").increment(1);
    Ok(restaurant)
}

/// Activates a pending restaurant on behalf of a platform actor.
///
/// The restaurant row is locked for the duration of the transaction, which is
/// bound to the target tenant so the admin user is written under it. A
/// restaurant that is not pending is rejected before anything is written.
/// The welcome email is sent after commit; its failure is logged and counted
/// but does not undo the activation.
pub async fn activate_restaurant(
    db: &DatabaseConnection,
    config: &AppConfig,
    mailer: &dyn Mailer,
    actor: &TenantContext,
    target: TenantId,
) -> Result<Activation, OnboardingError> {
    let result = provision(db, config, actor, target).await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(OnboardingError::NotPending(_)) => "conflict",
        Err(_) => "failure",
    };
    metrics::counter!("tenant_activation_total", "outcome" => outcome).increment(1);

    let (activation, temporary_password) = result?;
    tracing::info!(
        restaurant_id = activation.restaurant.id,
        admin_user_id = activation.admin.id,
        activated_by = actor.user_id,
        "Restaurant activated"
    );

    let admin_name = format!(
        "{} {}",
        activation.admin.first_name, activation.admin.last_name
    );
    let email = welcome_email(
        config,
        &activation.restaurant.name,
        admin_name.trim(),
        &activation.admin.email,
        &temporary_password,
    );
    if let Err(err) = mailer.send_template(&email).await {
        metrics::counter!("welcome_email_failures_total").increment(1);
        tracing::warn!(
            error = %err,
            restaurant_id = activation.restaurant.id,
            "Failed to send welcome email"
        );
    }

    Ok(activation)
}

async fn provision(
    db: &DatabaseConnection,
    config: &AppConfig,
    actor: &TenantContext,
    target: TenantId,
) -> Result<(Activation, String), OnboardingError> {
    if target.is_platform() {
        return Err(OnboardingError::PlatformOrganization);
    }

    let session = TenantSession::begin_for(db, target, actor.role).await?;
    let restaurants = RestaurantRepository::new(session.conn());
    let restaurant = restaurants
        .get_for_update(target)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound(_) => OnboardingError::NotFound,
            other => other.into(),
        })?;

    if restaurant.status() != Some(RestaurantStatus::Pending) {
        return Err(OnboardingError::NotPending(restaurant.status.clone()));
    }

    let users = UserRepository::new(session.conn(), target);
    if users
        .find_by_email(&restaurant.contact_email)
        .await?
        .is_some()
    {
        return Err(OnboardingError::AdminExists);
    }

    let temporary_password = generate_temporary_password();
    let password_hash = hash_password(&temporary_password, config.password_hash_cost).await?;
    let (first_name, last_name) = split_contact_name(&restaurant.contact_name);
    let admin = users
        .create(NewUser {
            email: restaurant.contact_email.clone(),
            password_hash,
            first_name,
            last_name,
            role: Role::Admin,
            is_platform_staff: false,
            phone: restaurant.contact_phone.clone(),
        })
        .await?;

    let kam_id = match (restaurant.kam_id, actor.role) {
        (Some(existing), _) => Some(existing),
        (None, Role::Kam) => Some(actor.user_id),
        (None, _) => None,
    };
    let restaurant = restaurants
        .mark_activated(restaurant, actor.user_id, kam_id)
        .await?;

    session.commit().await?;
    Ok((Activation { restaurant, admin }, temporary_password))
}

/// Sets the status of an already onboarded restaurant.
pub async fn update_status(
    db: &DatabaseConnection,
    target: TenantId,
    status: RestaurantStatus,
) -> Result<restaurant::Model, OnboardingError> {
    if target.is_platform() {
        return Err(OnboardingError::PlatformOrganization);
    }
    if status == RestaurantStatus::Pending {
        return Err(OnboardingError::PendingNotAllowed);
    }

    let restaurants = RestaurantRepository::new(db);
    let restaurant = restaurants
        .find(target)
        .await?
        .ok_or(OnboardingError::NotFound)?;

    if restaurant.status() == Some(RestaurantStatus::Pending) && status == RestaurantStatus::Active
    {
        return Err(OnboardingError::ActivationRequired);
    }

    let previous = restaurant.status.clone();
    let restaurant = restaurants.set_status(restaurant, status).await?;
    tracing::info!(
        restaurant_id = restaurant.id,
        from = %previous,
        to = %status,
        "Restaurant status changed"
    );
    Ok(restaurant)
}

/// Makes `kam_id` the key account manager of `target`.
pub async fn assign_kam(
    db: &DatabaseConnection,
    target: TenantId,
    kam_id: i64,
) -> Result<restaurant::Model, OnboardingError> {
    if target.is_platform() {
        return Err(OnboardingError::PlatformOrganization);
    }

    let kam = UserRepository::new(db, PLATFORM_ORGANIZATION_ID)
        .find(kam_id)
        .await?
        .filter(|user| user.role() == Some(Role::Kam) && user.is_platform_staff && user.is_active)
        .ok_or(OnboardingError::InvalidKam(kam_id))?;

    let restaurants = RestaurantRepository::new(db);
    let restaurant = restaurants
        .find(target)
        .await?
        .ok_or(OnboardingError::NotFound)?;
    let restaurant = restaurants.assign_kam(restaurant, kam.id).await?;
    tracing::info!(restaurant_id = restaurant.id, kam_id = kam.id, "KAM assigned");
    Ok(restaurant)
}

/// Splits a contact name into first name and the remaining words.
fn split_contact_name(full_name: &str) -> (String, String) {
    let mut words = full_name.split_whitespace();
    match words.next() {
        Some(first) => (first.to_string(), words.collect::<Vec<_>>().join(" ")),
        None => (full_name.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_name_is_split_on_first_word() {
        assert_eq!(
            split_contact_name("Ada  Lovelace King"),
            ("Ada".to_string(), "Lovelace King".to_string())
        );
        assert_eq!(
            split_contact_name("Cher"),
            ("Cher".to_string(), String::new())
        );
        assert_eq!(split_contact_name("  "), (String::new(), String::new()));
    }

    #[test]
    fn state_errors_map_to_conflict_and_validation() {
        let conflict: ApiError = OnboardingError::NotPending("active".to_string()).into();
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let pending: ApiError = OnboardingError::PendingNotAllowed.into();
        assert_eq!(pending.status, StatusCode::BAD_REQUEST);

        let sentinel: ApiError = OnboardingError::PlatformOrganization.into();
        assert_eq!(sentinel.status, StatusCode::FORBIDDEN);

        let missing: ApiError = OnboardingError::NotFound.into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }
}
