//! Tenant identity and request-scoped tenant context.
//!
//! Every tenant-owned row carries a `restaurant_id`. A request acts for exactly
//! one restaurant, described by [`TenantContext`], which is derived from the
//! access token and handed explicitly to every repository. Platform staff are
//! identified by an explicit capability flag, not by the restaurant they are
//! stored under.

mod session;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use session::TenantSession;

/// Identifier of a restaurant, the unit of data isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

/// The platform organization. Platform staff accounts are stored under it.
pub const PLATFORM_ORGANIZATION_ID: TenantId = TenantId(1);

impl TenantId {
    /// Accepts only positive ids; there is no default tenant.
    pub fn new(id: i64) -> Result<Self, TenantContextError> {
        if id > 0 {
            Ok(Self(id))
        } else {
            Err(TenantContextError::InvalidRestaurant(id))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_platform(self) -> bool {
        self == PLATFORM_ORGANIZATION_ID
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Role of a user within its restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    Staff,
    Client,
    #[serde(rename = "KAM")]
    Kam,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Staff => "Staff",
            Role::Client => "Client",
            Role::Kam => "KAM",
        }
    }

    /// Roles that may be assigned to users inside a regular restaurant.
    pub fn is_tenant_assignable(self) -> bool {
        !matches!(self, Role::Kam)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TenantContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Staff" => Ok(Role::Staff),
            "Client" => Ok(Role::Client),
            "KAM" => Ok(Role::Kam),
            other => Err(TenantContextError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TenantContextError {
    #[error("restaurant id must be positive, got {0}")]
    InvalidRestaurant(i64),
    #[error("user id must be positive, got {0}")]
    InvalidUser(i64),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Who is acting, and for which restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: i64,
    pub restaurant_id: TenantId,
    pub role: Role,
    pub email: String,
    platform_staff: bool,
}

impl TenantContext {
    pub fn new(
        user_id: i64,
        restaurant_id: TenantId,
        role: Role,
        email: impl Into<String>,
        platform_staff: bool,
    ) -> Result<Self, TenantContextError> {
        if user_id <= 0 {
            return Err(TenantContextError::InvalidUser(user_id));
        }
        Ok(Self {
            user_id,
            restaurant_id,
            role,
            email: email.into(),
            platform_staff,
        })
    }

    /// Platform staff hold the explicit capability and a KAM or Admin role.
    pub fn is_platform_staff(&self) -> bool {
        self.platform_staff && matches!(self.role, Role::Kam | Role::Admin)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}
