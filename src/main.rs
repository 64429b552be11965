//! # Restaurant Platform API Main Entry Point

use anyhow::Context;
use restaurant_platform::{config::ConfigLoader, db, seeds, server::run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::run_migrations(&db).await?;

    let report = seeds::bootstrap_platform(&db, &config)
        .await
        .context("bootstrapping platform organization")?;
    tracing::info!(
        sentinel_created = report.sentinel_created,
        admin_created = report.admin_created,
        "Platform bootstrap complete"
    );

    run_server(config, db).await
}
