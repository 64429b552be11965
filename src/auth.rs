//! # Authentication and Authorization
//!
//! Bearer token authentication for tenant-scoped and platform-scoped routes.
//! The middleware verifies the access token and attaches the resulting
//! [`TenantContext`] to the request before any handler (and therefore any
//! query) runs. Requests without a complete context are rejected.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, forbidden, unauthorized, unauthorized_with_trace_id};
use crate::server::AppState;
use crate::telemetry::TraceContext;
use crate::tenancy::{Role, TenantContext};
use crate::tokens::JwtKeys;

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.jwt)
    }
}

/// Authentication middleware that verifies the bearer token and attaches the
/// tenant context.
pub async fn auth_middleware(
    State(keys): State<Arc<JwtKeys>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = request
        .extensions()
        .get::<TraceContext>()
        .map(|ctx| ctx.trace_id.clone());
    let reject = |message: &str| match trace_id.clone() {
        Some(trace_id) => unauthorized_with_trace_id(Some(message), trace_id),
        None => unauthorized(Some(message)),
    };

    let token = extract_bearer_token(request.headers()).map_err(reject)?;
    let context = keys.verify(token).map_err(|err| {
        tracing::debug!(error = %err, "Rejected access token");
        metrics::counter!("auth_rejected_total").increment(1);
        reject("Invalid or expired token")
    })?;

    tracing::debug!(
        user_id = context.user_id,
        restaurant_id = %context.restaurant_id,
        role = %context.role,
        "Authenticated request"
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header")?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or("Authorization header must use Bearer scheme")
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| unauthorized(None))
    }
}

/// Tenant context of a caller holding the platform staff capability.
#[derive(Debug, Clone)]
pub struct PlatformStaff(pub TenantContext);

impl<S> FromRequestParts<S> for PlatformStaff
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = TenantContext::from_request_parts(parts, state).await?;
        if !context.is_platform_staff() {
            tracing::info!(
                user_id = context.user_id,
                role = %context.role,
                "Platform route denied"
            );
            return Err(forbidden(Some("Platform staff access required")));
        }
        Ok(Self(context))
    }
}

/// Fails with 403 unless the caller holds one of `roles`.
pub fn require_role(context: &TenantContext, roles: &[Role]) -> Result<(), ApiError> {
    if context.has_any_role(roles) {
        Ok(())
    } else {
        Err(forbidden(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    use crate::models::user;
    use crate::tenancy::PLATFORM_ORGANIZATION_ID;

    fn keys() -> Arc<JwtKeys> {
        Arc::new(JwtKeys::new(
            b"auth-test-secret-auth-test-secret",
            Duration::hours(1),
        ))
    }

    fn token_for(keys: &JwtKeys, restaurant_id: i64, role: &str, platform: bool) -> String {
        let now = Utc::now().into();
        let user = user::Model {
            id: 11,
            restaurant_id,
            email: "someone@bistro.example".to_string(),
            password_hash: String::new(),
            first_name: "Some".to_string(),
            last_name: "One".to_string(),
            role: role.to_string(),
            is_platform_staff: platform,
            is_active: true,
            phone: None,
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            preferences: None,
            created_at: now,
            updated_at: now,
        };
        keys.issue(&user).unwrap().token
    }

    async fn whoami(context: TenantContext) -> String {
        format!("{}:{}", context.restaurant_id, context.role)
    }

    async fn platform_only(PlatformStaff(context): PlatformStaff) -> String {
        context.email
    }

    async fn send(keys: Arc<JwtKeys>, uri: &str, authorization: Option<String>) -> Response {
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route("/platform", get(platform_only))
            .layer(axum::middleware::from_fn_with_state(keys, auth_middleware));

        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let response = send(keys(), "/whoami", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let response = send(keys(), "/whoami", Some("Basic dGVzdDoxMjM=".to_string())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_returns_401() {
        let response = send(keys(), "/whoami", Some("Bearer not-a-jwt".to_string())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_exposes_tenant_context() {
        let keys = keys();
        let token = token_for(&keys, 5, "Staff", false);
        let response = send(keys, "/whoami", Some(format!("Bearer {token}"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"5:Staff");
    }

    #[tokio::test]
    async fn tenant_admin_is_not_platform_staff() {
        let keys = keys();
        let token = token_for(&keys, 5, "Admin", false);
        let response = send(keys, "/platform", Some(format!("Bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn sentinel_membership_alone_is_not_platform_staff() {
        let keys = keys();
        let token = token_for(&keys, PLATFORM_ORGANIZATION_ID.get(), "KAM", false);
        let response = send(keys, "/platform", Some(format!("Bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn platform_kam_passes_platform_gate() {
        let keys = keys();
        let token = token_for(&keys, PLATFORM_ORGANIZATION_ID.get(), "KAM", true);
        let response = send(keys, "/platform", Some(format!("Bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn require_role_checks_membership() {
        let ctx = TenantContext::new(
            3,
            crate::tenancy::TenantId::new(5).unwrap(),
            Role::Client,
            "c@r.io",
            false,
        )
        .unwrap();
        assert!(require_role(&ctx, &[Role::Client, Role::Staff]).is_ok());
        assert_eq!(
            require_role(&ctx, &[Role::Admin]).unwrap_err().status,
            StatusCode::FORBIDDEN
        );
    }
}
