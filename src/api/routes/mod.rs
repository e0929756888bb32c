//! API Routes
//!
//! Route handlers organized by functionality.

pub mod analytics;
pub mod health;
pub mod messages;
pub mod projects;
pub mod records;
pub mod users;
