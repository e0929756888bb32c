//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::chat::UserId;
use crate::records::Record;

// ============================================
// CHAT DTOs
// ============================================

/// Query for the history endpoint
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// The other side of the conversation; no counterpart means no messages
    #[serde(default)]
    pub other_user_id: Option<UserId>,
}

/// Generic `{"status": ...}` acknowledgement
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

// ============================================
// ANALYTICS DTOs
// ============================================

/// Date window for `GET /api/analytics`; missing bounds are open-ended
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Parameters for `GET /api/analytics/export`
#[derive(Debug, Deserialize)]
pub struct AnalyticsExportParams {
    /// `traffic-sources` or `top-pages`
    pub section: String,
    /// `json` (default) or `csv`
    #[serde(default = "default_export_format")]
    pub format: String,
}

fn default_export_format() -> String {
    "json".to_string()
}

// ============================================
// RECORD DTOs
// ============================================

/// Create or edit a record
#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub name: String,
    pub role: String,
}

/// Status filter for listing records
#[derive(Debug, Default, Deserialize)]
pub struct RecordListParams {
    /// `All`, `Active` or `Inactive`
    pub status: Option<String>,
}

/// Record list response
#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<Record>,
    pub total: usize,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub removed: usize,
}

// ============================================
// PROJECT DTOs
// ============================================

/// `{"message": ...}` acknowledgement
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or degraded
    pub status: String,
    /// Chat database status
    pub storage: String,
    /// Users with a live WebSocket
    pub online_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
