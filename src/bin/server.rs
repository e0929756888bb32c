//! Nexus API Server
//!
//! Run with: cargo run --bin nexus-server
//!
//! # Configuration
//!
//! Read from the first config file found (see `nexus config`), then
//! environment overrides:
//! - `NEXUS_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `NEXUS_API_PORT`: Port to listen on (default: 8000)
//! - `NEXUS_DATA_DIR`: Directory for the chat and projects databases and the
//!   analytics snapshot
//! - `RUST_LOG`: Log filter (default: nexus=info)

use chrono::Utc;
use nexus::analytics::{AnalyticsService, FileStore};
use nexus::api::{serve, ApiConfig, AppState};
use nexus::config::Config;
use nexus::storage::{ChatStore, ProjectStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    nexus::logging::init(&config.logging)?;

    tracing::info!("Starting Nexus API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.storage.data_dir);

    std::fs::create_dir_all(&config.storage.data_dir)?;

    let chat_store = Arc::new(ChatStore::open(&config.storage.chat_db_path())?);
    chat_store.seed_default_users(Utc::now())?;

    let projects = Arc::new(ProjectStore::open(&config.storage.projects_db_path())?);

    let snapshot_store = FileStore::new(&config.storage.data_dir, &config.analytics.storage_key)?;
    tracing::info!(path = ?snapshot_store.path(), "Analytics snapshot store");
    let analytics = AnalyticsService::new(Arc::new(snapshot_store));

    let api_config = ApiConfig::from(&config.api);
    let state = AppState::new(chat_store, projects, analytics, api_config.clone());

    serve(state, &api_config).await?;

    tracing::info!("Nexus API server stopped");
    Ok(())
}
