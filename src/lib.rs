//! # Restaurant Platform Library
//!
//! Multi-tenant restaurant management API: tenant isolation, onboarding of
//! restaurants by platform staff, and CRUD over menus, reservations, orders
//! and users.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod onboarding;
pub mod password;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod tenancy;
pub mod tokens;
pub mod validation;
pub use migration;
