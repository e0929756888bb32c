//! Chat Connection Hub
//!
//! One live connection per user. A new connection for a user replaces the
//! previous one; each connection carries its own id so a stale socket closing
//! late cannot unregister its replacement.

use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::chat::{DeliverFrame, UserId};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrently connected users
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending frames to one connection
pub struct ConnectionHandle {
    pub connection_id: ConnectionId,
    pub sender: mpsc::UnboundedSender<DeliverFrame>,
}

/// Registry of connected users
pub struct ChatHub {
    connections: RwLock<HashMap<UserId, ConnectionHandle>>,
    config: HubConfig,
}

impl ChatHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register `user_id`'s connection, replacing any existing one
    ///
    /// Fails only when a new user would exceed the connection limit.
    pub async fn register(
        &self,
        user_id: UserId,
        sender: mpsc::UnboundedSender<DeliverFrame>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if !connections.contains_key(&user_id) && connections.len() >= self.config.max_connections
        {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let connection_id = Uuid::new_v4().to_string();
        let replaced = connections.insert(
            user_id,
            ConnectionHandle {
                connection_id: connection_id.clone(),
                sender,
            },
        );

        tracing::info!(
            user_id,
            connection_id = %connection_id,
            replaced = replaced.is_some(),
            "WebSocket connected"
        );
        Ok(connection_id)
    }

    /// Remove `user_id` if `connection_id` is still its registered connection
    ///
    /// Returns whether the user was removed.
    pub async fn unregister(&self, user_id: UserId, connection_id: &str) -> bool {
        let mut connections = self.connections.write().await;
        let current = connections
            .get(&user_id)
            .map(|handle| handle.connection_id == connection_id)
            .unwrap_or(false);

        if current {
            connections.remove(&user_id);
            tracing::info!(user_id, connection_id = %connection_id, "WebSocket disconnected");
        } else {
            tracing::debug!(
                user_id,
                connection_id = %connection_id,
                "Stale connection closed"
            );
        }
        current
    }

    /// Deliver a frame to `user_id` if connected
    ///
    /// Returns whether the frame was queued on a live connection.
    pub async fn send_personal(&self, user_id: UserId, frame: DeliverFrame) -> bool {
        let connections = self.connections.read().await;
        match connections.get(&user_id) {
            Some(handle) => handle.sender.send(frame).is_ok(),
            None => false,
        }
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.connections.read().await.contains_key(&user_id)
    }

    /// Connected user ids, sorted
    pub async fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.connections.read().await.keys().copied().collect();
        users.sort_unstable();
        users
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),
}
