//! Access token issuance and verification (HS256 JWT).
//!
//! Tokens carry everything the tenant context needs. Every claim is mandatory:
//! a token missing any of them fails to decode, so no request proceeds with a
//! defaulted restaurant or role.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::user;
use crate::tenancy::{Role, TenantContext, TenantContextError, TenantId};

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub email: String,
    pub role: Role,
    /// Explicit platform staff capability.
    pub platform: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token could not be decoded: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token claims are inconsistent: {0}")]
    Claims(#[from] TenantContextError),
    #[error("user {0} has an unknown role")]
    UnknownRole(i64),
}

/// A freshly issued access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signing and verification keys plus token lifetime.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(config.jwt_expiration_hours),
        )
    }

    /// Issues a token for `user`.
    pub fn issue(&self, user: &user::Model) -> Result<IssuedToken, TokenError> {
        let role = user.role().ok_or(TokenError::UnknownRole(user.id))?;
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            restaurant_id: user.restaurant_id,
            email: user.email.clone(),
            role,
            platform: user.is_platform_staff,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies `token` and derives the tenant context from its claims.
    pub fn verify(&self, token: &str) -> Result<TenantContext, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        let restaurant = TenantId::new(claims.restaurant_id)?;
        let context = TenantContext::new(
            claims.user_id,
            restaurant,
            claims.role,
            claims.email,
            claims.platform,
        )?;
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::PLATFORM_ORGANIZATION_ID;

    fn keys() -> JwtKeys {
        JwtKeys::new(b"unit-test-secret-unit-test-secret", Duration::hours(1))
    }

    fn user(id: i64, restaurant_id: i64, role: &str, platform: bool) -> user::Model {
        let now = Utc::now().into();
        user::Model {
            id,
            restaurant_id,
            email: "chef@bistro.example".to_string(),
            password_hash: String::new(),
            first_name: "Ada".to_string(),
            last_name: "Chef".to_string(),
            role: role.to_string(),
            is_platform_staff: platform,
            is_active: true,
            phone: None,
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            preferences: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_verifies_to_context() {
        let keys = keys();
        let issued = keys.issue(&user(42, 5, "Staff", false)).unwrap();
        let ctx = keys.verify(&issued.token).unwrap();

        assert_eq!(ctx.user_id, 42);
        assert_eq!(ctx.restaurant_id.get(), 5);
        assert_eq!(ctx.role, Role::Staff);
        assert_eq!(ctx.email, "chef@bistro.example");
        assert!(!ctx.is_platform_staff());
    }

    #[test]
    fn platform_flag_travels_in_token() {
        let keys = keys();
        let issued = keys
            .issue(&user(1, PLATFORM_ORGANIZATION_ID.get(), "KAM", true))
            .unwrap();
        assert!(keys.verify(&issued.token).unwrap().is_platform_staff());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = keys().issue(&user(42, 5, "Admin", false)).unwrap();
        let other = JwtKeys::new(b"another-secret-another-secret-xx", Duration::hours(1));
        assert!(matches!(
            other.verify(&issued.token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new(b"unit-test-secret-unit-test-secret", Duration::hours(-2));
        let issued = keys.issue(&user(42, 5, "Admin", false)).unwrap();
        assert!(keys.verify(&issued.token).is_err());
    }

    #[test]
    fn token_missing_restaurant_claim_is_rejected() {
        #[derive(Serialize)]
        struct Partial {
            sub: String,
            user_id: i64,
            email: String,
            role: Role,
            platform: bool,
            iat: i64,
            exp: i64,
        }
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                sub: "x@y.io".to_string(),
                user_id: 3,
                email: "x@y.io".to_string(),
                role: Role::Admin,
                platform: false,
                iat: now,
                exp: now + 3600,
            },
            &EncodingKey::from_secret(b"unit-test-secret-unit-test-secret"),
        )
        .unwrap();

        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn non_positive_restaurant_is_rejected() {
        let keys = keys();
        let issued = keys.issue(&user(42, 0, "Admin", false)).unwrap();
        assert!(matches!(
            keys.verify(&issued.token),
            Err(TokenError::Claims(TenantContextError::InvalidRestaurant(0)))
        ));
    }

    #[test]
    fn unknown_role_cannot_be_issued() {
        assert!(matches!(
            keys().issue(&user(42, 5, "Owner", false)),
            Err(TokenError::UnknownRole(42))
        ));
    }
}
