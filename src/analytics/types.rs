//! Core data types for the analytics snapshot
//!
//! The snapshot is persisted as a single JSON blob, so field names follow the
//! camelCase layout of the stored document:
//! - `Snapshot`: the whole dataset
//! - `Kpis` / `Kpi`: headline figures with trend against the previous period
//! - `SeriesPoint`: one point of the revenue/users time series
//! - `DemographicBucket`, `TrafficSource`, `PageStat`: fixed tables
//! - `DateRange`: the `{start, end}` window that filters the time series

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::error::{AnalyticsError, AnalyticsResult};

/// The full analytics dataset, read and written as one unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub kpis: Kpis,
    /// Revenue and user counts over time, oldest first
    pub revenue_data: Vec<SeriesPoint>,
    pub demographics: Vec<DemographicBucket>,
    pub traffic_sources: Vec<TrafficSource>,
    pub top_pages: Vec<PageStat>,
}

/// Headline KPI figures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Kpis {
    pub revenue: Kpi,
    pub users: Kpi,
    pub conversion: Kpi,
    /// Average engagement, in seconds
    pub engagement: Kpi,
}

/// A single KPI with its trend against the previous period
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub value: f64,
    /// Percentage change against the previous period
    pub trend: f64,
    pub prev_value: f64,
}

impl Kpi {
    pub fn new(value: f64, trend: f64, prev_value: f64) -> Self {
        Self {
            value,
            trend,
            prev_value,
        }
    }
}

/// One point of the revenue/users time series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub date: DateTime<Utc>,
    #[serde(serialize_with = "whole_as_integer")]
    pub revenue: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub users: f64,
}

/// Share of users in an age bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemographicBucket {
    pub age: String,
    pub percentage: f64,
}

/// Visits attributed to one traffic source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficSource {
    pub name: String,
    #[serde(serialize_with = "whole_as_integer")]
    pub value: f64,
    pub percentage: f64,
}

/// Per-page statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageStat {
    pub url: String,
    #[serde(serialize_with = "whole_as_integer")]
    pub views: f64,
    /// Average time on page, in seconds
    #[serde(serialize_with = "whole_as_integer")]
    pub avg_time: f64,
    pub bounce_rate: f64,
}

/// Counts are stored as plain JSON numbers; whole values are written back
/// without a fractional part
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Date window used to filter the time series
///
/// Bounds are kept as the strings the user entered. No ordering is enforced
/// between `start` and `end`; an inverted window simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Build a range from calendar dates (`YYYY-MM-DD` bounds)
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
        }
    }

    /// A range that covers every representable point
    pub fn all_time() -> Self {
        Self::new("0001-01-01", "9999-12-31")
    }

    /// Resolve both bounds to inclusive instants
    ///
    /// A date-only start is the first instant of that day and a date-only end
    /// is the last instant of that day. RFC 3339 bounds are taken as-is.
    pub fn bounds(&self) -> AnalyticsResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_bound(&self.start, NaiveTime::MIN)?;
        let end = parse_bound(&self.end, end_of_day())?;
        Ok((start, end))
    }

    /// Check whether an instant falls inside the window
    pub fn contains(&self, instant: &DateTime<Utc>) -> AnalyticsResult<bool> {
        let (start, end) = self.bounds()?;
        Ok(*instant >= start && *instant <= end)
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

fn parse_bound(s: &str, time_of_day: NaiveTime) -> AnalyticsResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(time_of_day)));
    }

    Err(AnalyticsError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_field_names_are_camel_case() {
        let page = PageStat {
            url: "/home".to_string(),
            views: 10.0,
            avg_time: 135.0,
            bounce_rate: 25.0,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"avgTime\":135,"));
        assert!(json.contains("\"views\":10,"));
        assert!(json.contains("\"bounceRate\":25.0"));

        let kpi = Kpi::new(1.0, 2.0, 3.0);
        let json = serde_json::to_string(&kpi).unwrap();
        assert!(json.contains("\"prevValue\":3.0"));
    }

    #[test]
    fn test_date_only_bounds_cover_whole_days() {
        let range = DateRange::new("2024-03-01", "2024-03-31");
        let (start, end) = range.bounds().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(end.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-31 23:59:59");

        let late = Utc.with_ymd_and_hms(2024, 3, 31, 22, 0, 0).unwrap();
        assert!(range.contains(&late).unwrap());
        let after = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        assert!(!range.contains(&after).unwrap());
    }

    #[test]
    fn test_rfc3339_bounds_are_exact() {
        let range = DateRange::new("2024-03-01T12:00:00Z", "2024-03-01T13:00:00Z");
        let inside = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 1).unwrap();
        assert!(range.contains(&inside).unwrap());
        assert!(!range.contains(&outside).unwrap());

        let at_start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let at_end = Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
        assert!(range.contains(&at_start).unwrap());
        assert!(range.contains(&at_end).unwrap());

        let before = Utc.with_ymd_and_hms(2024, 3, 1, 11, 59, 59).unwrap();
        assert!(!range.contains(&before).unwrap());
    }

    #[test]
    fn test_fractional_counts_are_kept() {
        let json = r#"{"date":"2024-03-01T00:00:00Z","revenue":1234.5,"users":17}"#;
        let point: SeriesPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.revenue, 1234.5);
        assert_eq!(point.users, 17.0);

        let written = serde_json::to_string(&point).unwrap();
        assert!(written.contains("\"revenue\":1234.5"));
        assert!(written.contains("\"users\":17}"));
    }

    #[test]
    fn test_invalid_bound() {
        let range = DateRange::new("yesterday-ish", "2024-01-01");
        assert!(matches!(range.bounds(), Err(AnalyticsError::InvalidDate(_))));
    }

    #[test]
    fn test_from_dates_formats_iso() {
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
        );
        assert_eq!(range.start, "2024-01-05");
        assert_eq!(range.end, "2024-02-09");
    }
}
