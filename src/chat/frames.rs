//! Chat wire types
//!
//! JSON frames exchanged over the live channel and the records served by the
//! chat HTTP API. Both the client and the server use these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric user identifier
pub type UserId = i64;

/// Client to server: deliver `content` to `receiver_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendFrame {
    pub receiver_id: UserId,
    pub content: String,
}

/// Server to client: a message from `sender_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverFrame {
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A persisted message as returned by the history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Body of the read-receipt request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkReadRequest {
    /// The reader
    pub user_id: UserId,
    /// Whose messages were read
    pub sender_id: UserId,
}

/// Presence of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Offline,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("online") {
            UserStatus::Online
        } else {
            UserStatus::Offline
        }
    }
}

/// A chat user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub status: UserStatus,
    pub last_seen: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_send_frame_shape() {
        let frame = SendFrame {
            receiver_id: 2,
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json, serde_json::json!({"receiver_id": 2, "content": "hi"}));
    }

    #[test]
    fn test_deliver_frame_accepts_offset_timestamps() {
        let frame: DeliverFrame = serde_json::from_str(
            r#"{"sender_id": 3, "content": "hello", "timestamp": "2024-06-15T10:30:00.123456+00:00"}"#,
        )
        .unwrap();
        assert_eq!(frame.sender_id, 3);
        assert_eq!(
            frame.timestamp.timestamp(),
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn test_history_read_defaults_to_false() {
        let msg: HistoryMessage = serde_json::from_str(
            r#"{"id": 1, "sender_id": 1, "receiver_id": 2, "content": "x", "timestamp": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(!msg.read);
    }

    #[test]
    fn test_user_status() {
        assert_eq!(UserStatus::parse("ONLINE"), UserStatus::Online);
        assert_eq!(UserStatus::parse("away"), UserStatus::Offline);
        assert_eq!(
            serde_json::to_string(&UserStatus::Online).unwrap(),
            "\"online\""
        );
    }
}
