use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use watchme::config::AppConfig;
use watchme::database::{DatabaseManager, PgDeviceStore};
use watchme::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, DB_*, PORT, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(config.logging.colorful)
        .init();

    info!("Starting watchme in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    let store = Arc::new(PgDeviceStore::new(pool.clone()));
    let result = server::serve(AppState::new(store, Arc::new(config))).await;

    DatabaseManager::close(&pool).await;
    result
}
