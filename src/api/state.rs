//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::analytics::AnalyticsService;
use crate::records::RecordTable;
use crate::storage::{ChatStore, ProjectStore};
use crate::websocket::{ChatHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Users and messages
    pub chat_store: Arc<ChatStore>,
    /// Projects board
    pub projects: Arc<ProjectStore>,
    /// Live chat connections
    pub hub: Arc<ChatHub>,
    /// Analytics snapshot access
    pub analytics: AnalyticsService,
    /// The CRUD table
    pub records: Arc<RwLock<RecordTable>>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        chat_store: Arc<ChatStore>,
        projects: Arc<ProjectStore>,
        analytics: AnalyticsService,
        config: ApiConfig,
    ) -> Self {
        Self::with_hub_config(chat_store, projects, analytics, config, HubConfig::default())
    }

    /// Create AppState with custom hub configuration
    pub fn with_hub_config(
        chat_store: Arc<ChatStore>,
        projects: Arc<ProjectStore>,
        analytics: AnalyticsService,
        config: ApiConfig,
        hub_config: HubConfig,
    ) -> Self {
        Self {
            chat_store,
            projects,
            hub: Arc::new(ChatHub::new(hub_config)),
            analytics,
            records: Arc::new(RwLock::new(RecordTable::with_sample_data())),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Number of users with a live connection
    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&crate::config::ApiConfig> for ApiConfig {
    fn from(config: &crate::config::ApiConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            cors_origins: config.cors_origins.clone(),
        }
    }
}
