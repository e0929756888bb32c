//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analytics::AnalyticsError;
use crate::records::RecordError;
use crate::storage::StorageError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Chat storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Analytics snapshot error
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Record table error
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(StorageError::UserNotFound(_)) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND")
            }
            ApiError::Storage(StorageError::ProjectNotFound(_)) => {
                (StatusCode::NOT_FOUND, "PROJECT_NOT_FOUND")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Analytics(AnalyticsError::InvalidDate(_))
            | ApiError::Analytics(AnalyticsError::Export(_)) => {
                (StatusCode::BAD_REQUEST, "ANALYTICS_REQUEST_ERROR")
            }
            ApiError::Analytics(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ANALYTICS_ERROR"),
            ApiError::Record(RecordError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "RECORD_NOT_FOUND")
            }
            ApiError::Record(RecordError::InvalidStatus(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Record(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RECORD_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
