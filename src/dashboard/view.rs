//! Dashboard render model
//!
//! Turns a snapshot into display-ready values: KPI cards, chart series and
//! table rows. Front-ends draw these as-is.

use serde::Serialize;

use crate::analytics::{Kpi, PageStat, Snapshot, TrafficSource};

/// Everything the dashboard shows after one load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub kpis: Vec<KpiCard>,
    /// Revenue and users over time
    pub revenue_chart: Vec<ChartSeries>,
    pub demographics_chart: DonutChart,
    pub traffic_sources: Vec<TrafficRow>,
    pub top_pages: Vec<PageRow>,
}

impl DashboardView {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let kpis = &snapshot.kpis;

        Self {
            kpis: vec![
                KpiCard::new("Revenue", &kpis.revenue, KpiFormat::Currency),
                KpiCard::new("New Users", &kpis.users, KpiFormat::Number),
                KpiCard::new("Conversion Rate", &kpis.conversion, KpiFormat::Percent),
                KpiCard::new("Avg. Engagement", &kpis.engagement, KpiFormat::Duration),
            ],
            revenue_chart: vec![
                ChartSeries {
                    name: "Revenue".to_string(),
                    points: snapshot
                        .revenue_data
                        .iter()
                        .map(|p| ChartPoint {
                            x: p.date.timestamp_millis(),
                            y: p.revenue,
                        })
                        .collect(),
                },
                ChartSeries {
                    name: "Users".to_string(),
                    points: snapshot
                        .revenue_data
                        .iter()
                        .map(|p| ChartPoint {
                            x: p.date.timestamp_millis(),
                            y: p.users,
                        })
                        .collect(),
                },
            ],
            demographics_chart: DonutChart {
                labels: snapshot.demographics.iter().map(|d| d.age.clone()).collect(),
                series: snapshot.demographics.iter().map(|d| d.percentage).collect(),
            },
            traffic_sources: snapshot.traffic_sources.iter().map(TrafficRow::from).collect(),
            top_pages: snapshot.top_pages.iter().map(PageRow::from).collect(),
        }
    }

    /// Find a KPI card by its title
    pub fn kpi(&self, title: &str) -> Option<&KpiCard> {
        self.kpis.iter().find(|card| card.title == title)
    }
}

/// How a KPI value is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiFormat {
    /// `$128,430`
    Currency,
    /// `2,845`
    Number,
    /// `3.6%`
    Percent,
    /// Seconds shown as `4m 32s`
    Duration,
}

/// Direction of a KPI trend arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

/// One KPI card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub title: String,
    pub value: String,
    pub trend: TrendDirection,
    /// e.g. `12.5% vs last month`
    pub trend_label: String,
}

impl KpiCard {
    pub fn new(title: &str, kpi: &Kpi, format: KpiFormat) -> Self {
        let value = match format {
            KpiFormat::Currency => format!("${}", format_number(kpi.value)),
            KpiFormat::Number => format_number(kpi.value),
            KpiFormat::Percent => format!("{}%", format_number(kpi.value)),
            KpiFormat::Duration => format_duration(kpi.value),
        };

        let trend = if kpi.trend >= 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        Self {
            title: title.to_string(),
            value,
            trend,
            trend_label: format!("{}% vs last month", kpi.trend.abs()),
        }
    }
}

/// One point of a time chart (x is milliseconds since epoch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: i64,
    pub y: f64,
}

/// A named line on a time chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// Labelled proportions for a donut chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutChart {
    pub labels: Vec<String>,
    pub series: Vec<f64>,
}

/// One row of the traffic source list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRow {
    pub name: String,
    /// CSS-style class derived from the name (`organic-search`)
    pub slug: String,
    pub icon: &'static str,
    pub value: String,
    pub percentage: f64,
}

impl From<&TrafficSource> for TrafficRow {
    fn from(source: &TrafficSource) -> Self {
        Self {
            name: source.name.clone(),
            slug: source.name.to_lowercase().replace(' ', "-"),
            icon: traffic_icon(&source.name),
            value: format_number(source.value),
            percentage: source.percentage,
        }
    }
}

/// Icon name for a traffic source
pub fn traffic_icon(name: &str) -> &'static str {
    match name {
        "Organic Search" => "search",
        "Direct" => "link",
        "Social Media" => "share-alt",
        "Referral" => "external-link-alt",
        "Email" => "envelope",
        _ => "globe",
    }
}

/// Bounce rate bucket used to colour the top pages table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BounceClass {
    High,
    Medium,
    Low,
}

impl BounceClass {
    pub fn from_rate(rate: f64) -> Self {
        if rate > 50.0 {
            BounceClass::High
        } else if rate > 30.0 {
            BounceClass::Medium
        } else {
            BounceClass::Low
        }
    }
}

/// One row of the top pages table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub url: String,
    pub views: String,
    pub avg_time: String,
    pub bounce_rate: f64,
    pub bounce_class: BounceClass,
}

impl From<&PageStat> for PageRow {
    fn from(page: &PageStat) -> Self {
        Self {
            url: page.url.clone(),
            views: format_number(page.views),
            avg_time: format_duration(page.avg_time),
            bounce_rate: page.bounce_rate,
            bounce_class: BounceClass::from_rate(page.bounce_rate),
        }
    }
}

/// Format a number with thousands separators and up to three decimals
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let sign = if negative { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// Format seconds as `Xm Ys`, rounded to whole seconds
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0).round() as u64;
    format!("{}m {}s", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::initial_data;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn view() -> DashboardView {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let snapshot = initial_data(now, &mut StdRng::seed_from_u64(1));
        DashboardView::from_snapshot(&snapshot)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(128_430.0), "128,430");
        assert_eq!(format_number(2_845.0), "2,845");
        assert_eq!(format_number(690.0), "690");
        assert_eq!(format_number(3.6), "3.6");
        assert_eq!(format_number(1_234_567.891), "1,234,567.891");
        assert_eq!(format_number(-1_200.5), "-1,200.5");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(272.0), "4m 32s");
        assert_eq!(format_duration(65.0), "1m 5s");
        assert_eq!(format_duration(59.0), "0m 59s");
        assert_eq!(format_duration(134.6), "2m 15s");
        assert_eq!(format_duration(-3.0), "0m 0s");
    }

    #[test]
    fn test_kpi_cards() {
        let view = view();

        let revenue = view.kpi("Revenue").unwrap();
        assert_eq!(revenue.value, "$128,430");
        assert_eq!(revenue.trend, TrendDirection::Up);
        assert_eq!(revenue.trend_label, "12.5% vs last month");

        let conversion = view.kpi("Conversion Rate").unwrap();
        assert_eq!(conversion.value, "3.6%");
        assert_eq!(conversion.trend, TrendDirection::Down);
        assert_eq!(conversion.trend_label, "1.2% vs last month");

        assert_eq!(view.kpi("New Users").unwrap().value, "2,845");
        assert_eq!(view.kpi("Avg. Engagement").unwrap().value, "4m 32s");
    }

    #[test]
    fn test_charts_follow_series() {
        let view = view();
        assert_eq!(view.revenue_chart.len(), 2);
        assert_eq!(view.revenue_chart[0].name, "Revenue");
        assert_eq!(view.revenue_chart[0].points.len(), 12);
        assert_eq!(view.revenue_chart[1].points.len(), 12);
        assert_eq!(view.demographics_chart.labels[0], "18-24");
        assert_eq!(view.demographics_chart.series[1], 55.0);
    }

    #[test]
    fn test_rows() {
        let view = view();

        let organic = &view.traffic_sources[0];
        assert_eq!(organic.slug, "organic-search");
        assert_eq!(organic.icon, "search");
        assert_eq!(organic.value, "12,450");
        assert_eq!(traffic_icon("Carrier Pigeon"), "globe");

        let home = &view.top_pages[0];
        assert_eq!(home.avg_time, "2m 15s");
        assert_eq!(home.bounce_class, BounceClass::Low);
        assert_eq!(BounceClass::from_rate(45.0), BounceClass::Medium);
        assert_eq!(BounceClass::from_rate(65.0), BounceClass::High);
        assert_eq!(BounceClass::from_rate(30.0), BounceClass::Low);
    }
}
