//! Analytics Data Service
//!
//! Reads the stored snapshot (or a synthetic baseline when nothing is stored),
//! filters its time series to a date window and writes replacements back.

use chrono::{DateTime, Months, Utc};
use rand::Rng;
use std::sync::Arc;

use super::error::AnalyticsResult;
use super::store::SnapshotStore;
use super::types::{
    DateRange, DemographicBucket, Kpi, Kpis, PageStat, SeriesPoint, Snapshot, TrafficSource,
};

/// Number of trailing monthly points in the synthetic dataset
pub const BASELINE_MONTHS: u32 = 12;

/// Data service over a snapshot store
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn SnapshotStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Return the snapshot with its time series limited to `range`
    ///
    /// When no snapshot is stored a fresh synthetic one is generated for this
    /// call only; it is not persisted.
    pub fn get_analytics(&self, range: &DateRange) -> AnalyticsResult<Snapshot> {
        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!("No stored snapshot, generating baseline");
                initial_data(Utc::now(), &mut rand::thread_rng())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching analytics");
                return Err(e);
            }
        };

        filter_by_date_range(snapshot, range)
    }

    /// Overwrite the stored snapshot and return it
    pub fn update_analytics(&self, data: Snapshot) -> AnalyticsResult<Snapshot> {
        if let Err(e) = self.store.save(&data) {
            tracing::error!(error = %e, "Error updating analytics");
            return Err(e);
        }

        tracing::info!(points = data.revenue_data.len(), "Analytics snapshot updated");
        Ok(data)
    }

    /// The raw stored snapshot, without generating a baseline
    pub fn stored_snapshot(&self) -> AnalyticsResult<Option<Snapshot>> {
        self.store.load()
    }
}

/// Keep only time-series points whose date lies inside `range`
///
/// Every other section passes through untouched.
pub fn filter_by_date_range(snapshot: Snapshot, range: &DateRange) -> AnalyticsResult<Snapshot> {
    let (start, end) = range.bounds()?;

    let revenue_data = snapshot
        .revenue_data
        .into_iter()
        .filter(|point| point.date >= start && point.date <= end)
        .collect();

    Ok(Snapshot {
        revenue_data,
        ..snapshot
    })
}

/// Generate the synthetic baseline dataset
///
/// The time series holds one point per month for the trailing
/// [`BASELINE_MONTHS`] months ending at `now`, oldest first.
pub fn initial_data<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> Snapshot {
    let mut months: Vec<DateTime<Utc>> = (0..BASELINE_MONTHS)
        .map(|i| now.checked_sub_months(Months::new(i)).unwrap_or(now))
        .collect();
    months.reverse();

    let revenue_data = months
        .into_iter()
        .map(|date| SeriesPoint {
            date,
            revenue: f64::from(rng.gen_range(30_000u32..120_000)),
            users: f64::from(rng.gen_range(1_000u32..3_000)),
        })
        .collect();

    Snapshot {
        kpis: Kpis {
            revenue: Kpi::new(128_430.0, 12.5, 114_160.0),
            users: Kpi::new(2_845.0, 8.3, 2_627.0),
            conversion: Kpi::new(3.6, -1.2, 3.64),
            engagement: Kpi::new(272.0, 0.8, 270.0),
        },
        revenue_data,
        demographics: vec![
            bucket("18-24", 44.0),
            bucket("25-34", 55.0),
            bucket("35-44", 13.0),
            bucket("45-54", 43.0),
            bucket("55+", 22.0),
        ],
        traffic_sources: vec![
            source("Organic Search", 12_450.0, 45.0),
            source("Direct", 8_320.0, 30.0),
            source("Social Media", 4_160.0, 15.0),
            source("Referral", 2_080.0, 7.5),
            source("Email", 690.0, 2.5),
        ],
        top_pages: vec![
            page("/home", 8_245.0, 135.0, 25.0),
            page("/products", 6_320.0, 222.0, 18.0),
            page("/about", 3_180.0, 90.0, 45.0),
            page("/blog", 2_845.0, 250.0, 22.0),
            page("/contact", 1_920.0, 65.0, 65.0),
        ],
    }
}

fn bucket(age: &str, percentage: f64) -> DemographicBucket {
    DemographicBucket {
        age: age.to_string(),
        percentage,
    }
}

fn source(name: &str, value: f64, percentage: f64) -> TrafficSource {
    TrafficSource {
        name: name.to_string(),
        value,
        percentage,
    }
}

fn page(url: &str, views: f64, avg_time: f64, bounce_rate: f64) -> PageStat {
    PageStat {
        url: url.to_string(),
        views,
        avg_time,
        bounce_rate,
    }
}
