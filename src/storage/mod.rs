//! Chat Server Storage
//!
//! SQLite persistence for the dashboard server:
//!
//! - **chat_store**: Users, presence and messages
//! - **project_store**: Projects with their team, tasks and comments
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use nexus::storage::ChatStore;
//! use chrono::Utc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ChatStore::open(std::path::Path::new("./nexus_data/chat.db"))?;
//!     store.seed_default_users(Utc::now())?;
//!
//!     store.insert_message(1, 2, "Hi Michael", Utc::now())?;
//!     for msg in store.conversation(2, 1)? {
//!         println!("{}: {}", msg.sender_id, msg.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod chat_store;
pub mod error;
pub mod project_store;

pub use chat_store::ChatStore;
pub use error::{StorageError, StorageResult};
pub use project_store::{Comment, Project, ProjectId, ProjectInput, ProjectStore, Task, TeamMember};
