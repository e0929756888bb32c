//! Chat WebSocket Relay
//!
//! Server side of the chat channel.
//!
//! ## Architecture
//!
//! - **ChatHub**: One live connection per user, keyed by user id
//! - **Handler**: Upgrades `/ws/:user_id`, persists and relays frames
//!
//! ## Protocol
//!
//! Clients send `{"receiver_id": 2, "content": "hi"}`. The receiver, if
//! connected, gets `{"sender_id": 1, "content": "hi", "timestamp": "..."}`.
//! The sender receives no echo.

mod handler;
mod hub;

pub use handler::websocket_handler;
pub use hub::{ChatHub, ConnectionHandle, ConnectionId, HubConfig, HubError};
