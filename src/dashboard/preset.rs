//! Date range presets
//!
//! Named shortcuts that compute a start/end pair relative to "today".

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::analytics::DateRange;

/// A named date window relative to the current date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    Today,
    Yesterday,
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[serde(rename = "last-30-days")]
    Last30Days,
    ThisMonth,
    LastMonth,
}

impl DatePreset {
    /// All presets in display order
    pub fn all() -> &'static [DatePreset] {
        &[
            DatePreset::Today,
            DatePreset::Yesterday,
            DatePreset::Last7Days,
            DatePreset::Last30Days,
            DatePreset::ThisMonth,
            DatePreset::LastMonth,
        ]
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            DatePreset::Today => "Today",
            DatePreset::Yesterday => "Yesterday",
            DatePreset::Last7Days => "Last 7 Days",
            DatePreset::Last30Days => "Last 30 Days",
            DatePreset::ThisMonth => "This Month",
            DatePreset::LastMonth => "Last Month",
        }
    }

    /// Start and end dates (both inclusive) for this preset
    pub fn dates(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DatePreset::Today => (today, today),
            DatePreset::Yesterday => {
                let yesterday = today - Duration::days(1);
                (yesterday, yesterday)
            }
            DatePreset::Last7Days => (today - Duration::days(7), today),
            DatePreset::Last30Days => (today - Duration::days(30), today),
            DatePreset::ThisMonth => (first_of_month(today), today),
            DatePreset::LastMonth => {
                let this_month = first_of_month(today);
                let start = this_month
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(this_month);
                // Day zero of this month is the last day of the previous one
                let end = this_month.pred_opt().unwrap_or(this_month);
                (start, end)
            }
        }
    }

    /// Date range for this preset
    pub fn range(&self, today: NaiveDate) -> DateRange {
        let (start, end) = self.dates(today);
        DateRange::from_dates(start, end)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl std::fmt::Display for DatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Unknown preset name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown date preset: {0}")]
pub struct UnknownPreset(pub String);

impl FromStr for DatePreset {
    type Err = UnknownPreset;

    /// Accepts button labels ("Last 7 Days") and slugs ("last-7-days")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "today" => Ok(DatePreset::Today),
            "yesterday" => Ok(DatePreset::Yesterday),
            "last-7-days" => Ok(DatePreset::Last7Days),
            "last-30-days" => Ok(DatePreset::Last30Days),
            "this-month" => Ok(DatePreset::ThisMonth),
            "last-month" => Ok(DatePreset::LastMonth),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}
