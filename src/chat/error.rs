//! Chat client error types

use thiserror::Error;

/// Errors raised by the chat client
#[derive(Error, Debug)]
pub enum ChatError {
    /// Send attempted while no channel is open
    #[error("Not connected")]
    NotConnected,

    /// Opening or using the live channel failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// History or read-receipt request failed
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Request timed out
    #[error("Request timeout")]
    Timeout,
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Serialization(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ChatError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ChatError::NotConnected.to_string(), "Not connected");

        let err = ChatError::Api {
            status: 404,
            message: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "API error 404: missing");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ChatError = json_err.into();
        assert!(matches!(err, ChatError::Serialization(_)));
    }
}
