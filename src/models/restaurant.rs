//! Restaurant entity model
//!
//! A restaurant is a tenant. Its status follows
//! `pending -> active` (activation only), with `active`, `inactive` and
//! `suspended` freely settable afterwards by platform staff.

use std::{fmt, str::FromStr};

use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "restaurants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub status: String,
    /// Key account manager responsible for the restaurant
    pub kam_id: Option<i64>,
    /// Platform user who activated the restaurant
    pub activated_by: Option<i64>,
    pub activated_at: Option<DateTimeWithTimeZone>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Option<RestaurantStatus> {
        self.status.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(RestaurantStatus::Active)
    }
}

/// Lifecycle state of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl RestaurantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RestaurantStatus::Pending => "pending",
            RestaurantStatus::Active => "active",
            RestaurantStatus::Inactive => "inactive",
            RestaurantStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for RestaurantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestaurantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RestaurantStatus::Pending),
            "active" => Ok(RestaurantStatus::Active),
            "inactive" => Ok(RestaurantStatus::Inactive),
            "suspended" => Ok(RestaurantStatus::Suspended),
            other => Err(format!("unknown restaurant status '{other}'")),
        }
    }
}
