//! # Nexus
//!
//! Backend and headless front-end logic for an admin dashboard: a one-to-one
//! chat with live delivery, an analytics dashboard over a single stored
//! snapshot, a small CRUD table and a decorative 3D scene.
//!
//! ## Features
//!
//! - **Chat client**: WebSocket session with fixed-delay reconnect, optimistic
//!   sends, per-sender previews and history loading with read receipts
//! - **Chat server**: SQLite-backed users and messages, live relay over
//!   WebSocket, presence tracking
//! - **Projects board**: SQLite-backed projects with team members, tasks and
//!   comments that are deleted along with their project
//! - **Analytics**: date-window filtering, synthetic baseline data, presets,
//!   search and SVG/JSON/CSV exports
//!
//! ## Modules
//!
//! - [`chat`]: Client-side connection manager and message store
//! - [`analytics`]: Snapshot store and data service
//! - [`dashboard`]: Controller, render model and exports
//! - [`records`]: In-memory CRUD table
//! - [`scene`]: Deterministic pose function for the 3D scene
//! - [`storage`]: SQLite chat and project persistence
//! - [`websocket`]: Server-side chat relay
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nexus::analytics::{AnalyticsService, DateRange, FileStore};
//! use nexus::dashboard::{DashboardController, DatePreset, Exporter};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::new("./nexus_data", "analytics")?;
//!     let service = AnalyticsService::new(Arc::new(store));
//!
//!     let today = chrono::Utc::now().date_naive();
//!     let mut controller = DashboardController::new(service, Exporter::new("./exports"), today);
//!
//!     let view = controller.apply_preset(DatePreset::Last7Days, today)?;
//!     for card in &view.kpis {
//!         println!("{}: {}", card.title, card.value);
//!     }
//!
//!     let filtered = controller.search("blog")?;
//!     println!("{} matching pages", filtered.top_pages.len());
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod records;
pub mod scene;
pub mod storage;
pub mod websocket;

// Re-export top-level types for convenience
pub use analytics::{AnalyticsError, AnalyticsService, DateRange, Snapshot};

pub use api::{build_router, serve, ApiError, AppState};

pub use chat::{ChatError, ChatEvent, ConnectionManager, HttpChatApi, WsConnector};

pub use dashboard::{DashboardController, DashboardView, DatePreset, ExportFormat, Exporter};

pub use records::{Record, RecordError, RecordStatus, RecordTable, StatusFilter};

pub use scene::{Scene, SceneConfig};

pub use storage::{ChatStore, Project, ProjectStore, StorageError, StorageResult};

pub use websocket::{websocket_handler, ChatHub, HubConfig, HubError};

pub use config::{
    AnalyticsConfig, ApiConfig as ConfigApiConfig, ChatConfig, Config, ConfigError, LoggingConfig,
    StorageConfig,
};
