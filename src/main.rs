use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use erp_api::config::{AppConfig, StoreBackend};
use erp_api::database::{manager::DatabaseManager, MemoryStore, PgStore, Store};
use erp_api::{app, mailer, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting ERP API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to the database")?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::with_schema())
        }
    };
    let mailer = mailer::from_config(&config.email);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(store, config, mailer);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("ERP API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
