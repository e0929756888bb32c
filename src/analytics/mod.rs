//! Analytics Data Service
//!
//! The dashboard's single datastore: one snapshot blob under one key.
//!
//! ## Modules
//!
//! - **types**: Snapshot sections and the `DateRange` filter window
//! - **store**: `SnapshotStore` trait with file and in-memory backends
//! - **service**: `AnalyticsService` (get/update) and the synthetic baseline
//! - **error**: Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use nexus::analytics::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::new("./nexus_data", "analytics")?;
//!     let service = AnalyticsService::new(Arc::new(store));
//!
//!     let snapshot = service.get_analytics(&DateRange::new("2024-01-01", "2024-06-30"))?;
//!     println!("{} points in range", snapshot.revenue_data.len());
//!     Ok(())
//! }
//! ```

mod error;
mod service;
mod store;
mod types;

pub use error::{AnalyticsError, AnalyticsResult};
pub use service::{filter_by_date_range, initial_data, AnalyticsService, BASELINE_MONTHS};
pub use store::{FileStore, MemoryStore, SnapshotStore};
pub use types::{
    DateRange, DemographicBucket, Kpi, Kpis, PageStat, SeriesPoint, Snapshot, TrafficSource,
};
