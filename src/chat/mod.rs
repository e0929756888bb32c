//! Chat client
//!
//! One live channel per user session, a transcript for the active
//! conversation and previews for everyone else.
//!
//! ## Modules
//!
//! - **client**: `ConnectionManager` and its fixed-delay reconnect loop
//! - **transcript**: `ChatState`, the in-memory message store
//! - **transport**: `Connector`/`Channel` seam and the WebSocket client
//! - **history**: History and read-receipt HTTP calls
//! - **frames**: Wire types shared with the server
//!
//! ## Example
//!
//! ```rust,no_run
//! use nexus::chat::*;
//! use nexus::config::ChatConfig;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), ChatError> {
//! let config = ChatConfig::default();
//! let api = HttpChatApi::new(config.api_url.clone(), config.request_timeout())?;
//! let (manager, mut events) =
//!     ConnectionManager::start(&config, 1, Arc::new(WsConnector), Arc::new(api));
//!
//! manager.select_conversation(2).await?;
//! manager.send("Hello!").await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod frames;
mod history;
mod transcript;
mod transport;

pub use client::{ChatEvent, ConnectionManager};
pub use error::{ChatError, ChatResult};
pub use frames::{DeliverFrame, HistoryMessage, MarkReadRequest, SendFrame, User, UserId, UserStatus};
pub use history::{ChatApi, HttpChatApi};
pub use transcript::{ChatState, Direction, Preview, TranscriptEntry};
pub use transport::{Channel, Connector, WsChannel, WsConnector};
