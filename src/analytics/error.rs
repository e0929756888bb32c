//! Analytics error types
//!
//! Errors raised by the snapshot store, the data service and exports.

use thiserror::Error;

/// Errors that can occur while reading, filtering or exporting analytics
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization of the snapshot failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A date bound could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Export could not be produced
    #[error("Export error: {0}")]
    Export(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        AnalyticsError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AnalyticsError {
    fn from(err: csv::Error) -> Self {
        AnalyticsError::Export(err.to_string())
    }
}

/// Result type alias for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyticsError::InvalidDate("2024-13-01".to_string());
        assert_eq!(err.to_string(), "Invalid date: 2024-13-01");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AnalyticsError = json_err.into();
        assert!(matches!(err, AnalyticsError::Serialization(_)));
    }
}
