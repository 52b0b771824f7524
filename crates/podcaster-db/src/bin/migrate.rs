//! podcaster-migrate: apply the embedded schema migrations.
//!
//! Environment variables:
//!   DATABASE_URL, PODCASTER_DB_*  - see `podcaster_core::config`
//!   LOG_FORMAT                    - "json" or "text" (default: "text")
//!   RUST_LOG                      - standard env filter (default: "podcaster_db=info")

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podcaster_db::{log_pool_metrics, AppConfig, Database};

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "podcaster_db=info,podcaster_migrate=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("loading configuration")?;
    let db = Database::connect_with_app_config(&config)
        .await
        .context("connecting to database")?;
    log_pool_metrics(db.pool());

    db.migrate().await.context("running migrations")?;

    info!(
        subsystem = "database",
        component = "migrate",
        "Migrations applied"
    );
    Ok(())
}
