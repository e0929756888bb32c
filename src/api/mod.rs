//! Nexus REST API
//!
//! HTTP and WebSocket layer for the dashboard backend, built with Axum.
//!
//! # Endpoints
//!
//! ## Chat
//! - `GET /ws/:user_id` - Chat WebSocket for one user
//! - `GET /api/users` - List users with presence
//! - `GET /api/users/:user_id/messages?other_user_id=` - Conversation history
//! - `POST /api/messages/mark-read` - Read receipt
//!
//! ## Analytics
//! - `GET /api/analytics?start=&end=` - Snapshot limited to a date window
//! - `PUT /api/analytics` - Replace the snapshot
//! - `GET /api/analytics/export?section=&format=` - Download a table section
//!
//! ## Records
//! - `GET /api/records?status=` - List records
//! - `POST /api/records` - Add a record
//! - `PUT /api/records/:id` - Edit a record
//! - `DELETE /api/records/:id` - Delete a record
//! - `GET /api/records/export` - CSV download
//!
//! ## Projects
//! - `GET /api/projects` - List projects with team, tasks and comments
//! - `GET /api/projects/:id` - One project
//! - `POST /api/projects` - Create a project
//! - `PUT /api/projects/:id` - Replace a project
//! - `DELETE /api/projects/:id` - Delete a project and its children
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use nexus::analytics::{AnalyticsService, FileStore};
//! use nexus::api::{serve, ApiConfig, AppState};
//! use nexus::storage::{ChatStore, ProjectStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let chat_store = Arc::new(ChatStore::open("./nexus_data/chat.db".as_ref())?);
//!     let projects = Arc::new(ProjectStore::open("./nexus_data/projects.db".as_ref())?);
//!     let analytics = AnalyticsService::new(Arc::new(FileStore::new("./nexus_data", "analytics")?));
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(chat_store, projects, analytics, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// CORS layer for the configured origins; no origins means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(parsed)
    }
}

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Chat routes
        .route("/users", get(routes::users::list_users))
        .route(
            "/users/:user_id/messages",
            get(routes::messages::conversation),
        )
        .route("/messages/mark-read", post(routes::messages::mark_read))
        // Analytics routes
        .route(
            "/analytics",
            get(routes::analytics::get_analytics).put(routes::analytics::update_analytics),
        )
        .route("/analytics/export", get(routes::analytics::export_section))
        // Record routes
        .route(
            "/records",
            get(routes::records::list_records).post(routes::records::create_record),
        )
        .route("/records/export", get(routes::records::export_records))
        .route(
            "/records/:id",
            put(routes::records::update_record).delete(routes::records::delete_record),
        )
        // Project routes
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .route("/ws/:user_id", get(websocket_handler))
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Nexus API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Nexus API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
