//! Message Store
//!
//! The transcript of the active conversation plus the latest-message preview
//! for every sender seen this session. Nothing here outlives the session; the
//! transcript is rebuilt from the server on every conversation switch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use super::frames::{DeliverFrame, HistoryMessage, UserId};

/// Whether a transcript entry was sent by this session's user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// One message in the visible transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub sender_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

impl TranscriptEntry {
    /// Sent entries carry a static delivered marker and nothing more
    pub fn is_sent(&self) -> bool {
        self.direction == Direction::Sent
    }
}

/// Latest message from one sender
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Client-side chat state for one session
#[derive(Debug, Clone)]
pub struct ChatState {
    user_id: UserId,
    active: Option<UserId>,
    transcript: Vec<TranscriptEntry>,
    previews: HashMap<UserId, Preview>,
}

impl ChatState {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            active: None,
            transcript: Vec::new(),
            previews: HashMap::new(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn active(&self) -> Option<UserId> {
        self.active
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn previews(&self) -> &HashMap<UserId, Preview> {
        &self.previews
    }

    /// Make `counterpart` the active conversation
    ///
    /// The transcript is left alone until history arrives.
    pub fn select(&mut self, counterpart: UserId) {
        self.active = Some(counterpart);
    }

    /// Replace the transcript with fetched history, in the order given
    pub fn replace_history(&mut self, history: &[HistoryMessage]) {
        self.transcript = history
            .iter()
            .map(|msg| TranscriptEntry {
                sender_id: msg.sender_id,
                content: msg.content.clone(),
                timestamp: msg.timestamp,
                direction: if msg.sender_id == self.user_id {
                    Direction::Sent
                } else {
                    Direction::Received
                },
            })
            .collect();
    }

    /// Apply an inbound message
    ///
    /// Appends to the transcript only when the sender is the active
    /// conversation; the sender's preview is updated either way. Returns the
    /// appended entry, if any.
    pub fn receive(&mut self, frame: &DeliverFrame) -> Option<TranscriptEntry> {
        self.previews.insert(
            frame.sender_id,
            Preview {
                content: frame.content.clone(),
                timestamp: frame.timestamp,
            },
        );

        if self.active != Some(frame.sender_id) {
            return None;
        }

        let entry = TranscriptEntry {
            sender_id: frame.sender_id,
            content: frame.content.clone(),
            timestamp: frame.timestamp,
            direction: Direction::Received,
        };
        self.transcript.push(entry.clone());
        Some(entry)
    }

    /// Record the optimistic local copy of a sent message
    pub fn record_sent(&mut self, content: &str, timestamp: DateTime<Utc>) -> TranscriptEntry {
        let entry = TranscriptEntry {
            sender_id: self.user_id,
            content: content.to_string(),
            timestamp,
            direction: Direction::Sent,
        };
        self.transcript.push(entry.clone());
        entry
    }
}
