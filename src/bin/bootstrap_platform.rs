use anyhow::{Context, Result};
use clap::Parser;
use restaurant_platform::{config::ConfigLoader, db, seeds, telemetry};

/// Applies migrations and seeds the platform organization without starting
/// the API server.
#[derive(Debug, Parser)]
#[command(name = "bootstrap_platform", version)]
struct Cli {
    /// Skip applying pending migrations
    #[arg(long)]
    skip_migrations: bool,
    /// Only apply migrations; do not seed
    #[arg(long, conflicts_with = "skip_migrations")]
    migrations_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    if !cli.skip_migrations {
        db::run_migrations(&db).await?;
    }
    if cli.migrations_only {
        println!("Migrations applied");
        return Ok(());
    }

    let report = seeds::bootstrap_platform(&db, &config)
        .await
        .context("bootstrapping platform organization")?;
    println!(
        "Platform organization {}; platform administrator {}",
        if report.sentinel_created { "created" } else { "already present" },
        if report.admin_created { "created" } else { "already present" },
    );
    Ok(())
}
