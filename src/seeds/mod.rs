//! Database seeding
//!
//! Data that must exist before the API can serve requests. Seeding is
//! idempotent and runs on every start after migrations.

pub mod platform;

pub use platform::{BootstrapError, BootstrapReport, bootstrap_platform, ensure_sentinel};
