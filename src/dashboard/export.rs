//! File exports
//!
//! Chart images (SVG) and data dumps (pretty JSON or CSV). Every filename
//! carries a timestamp so repeated downloads never overwrite each other.

use chrono::Utc;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::view::{ChartSeries, DonutChart};
use crate::analytics::{AnalyticsError, AnalyticsResult};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 400.0;
const CHART_PADDING: f64 = 40.0;
const PALETTE: [&str; 5] = ["#4361ee", "#7209b7", "#4cc9f0", "#f72585", "#3a0ca3"];

/// Data dump format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AnalyticsError::Export(format!("Unsupported format: {}", other))),
        }
    }
}

/// Timestamped export filename, e.g. `top-pages-20240615_103000.json`
pub fn export_filename(stem: &str, extension: &str) -> String {
    format!(
        "{}-{}.{}",
        stem,
        Utc::now().format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Serialize rows in the requested format
pub fn render_rows<T: Serialize>(rows: &[T], format: ExportFormat) -> AnalyticsResult<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in rows {
                writer.serialize(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| AnalyticsError::Export(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| AnalyticsError::Export(e.to_string()))
        }
    }
}

/// Writes exports into a directory
#[derive(Debug, Clone)]
pub struct Exporter {
    out_dir: PathBuf,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Dump rows to `{stem}-{timestamp}.{json|csv}`
    pub fn export_rows<T: Serialize>(
        &self,
        stem: &str,
        rows: &[T],
        format: ExportFormat,
    ) -> AnalyticsResult<PathBuf> {
        let body = render_rows(rows, format)?;
        self.write(&export_filename(stem, format.extension()), &body)
    }

    /// Render a time chart to `{chart_id}-{timestamp}.svg`
    pub fn export_line_chart(
        &self,
        chart_id: &str,
        series: &[ChartSeries],
    ) -> AnalyticsResult<PathBuf> {
        self.write(&export_filename(chart_id, "svg"), &render_line_chart_svg(series))
    }

    /// Render a donut chart to `{chart_id}-{timestamp}.svg`
    pub fn export_donut_chart(&self, chart_id: &str, chart: &DonutChart) -> AnalyticsResult<PathBuf> {
        self.write(&export_filename(chart_id, "svg"), &render_donut_svg(chart))
    }

    fn write(&self, filename: &str, body: &str) -> AnalyticsResult<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(filename);
        std::fs::write(&path, body)?;

        tracing::info!(path = ?path, bytes = body.len(), "Export written");
        Ok(path)
    }
}

/// Render line series as an SVG document
///
/// Each series is scaled to its own y range so revenue and users share the
/// canvas the way a dual-axis chart would draw them.
pub fn render_line_chart_svg(series: &[ChartSeries]) -> String {
    let mut svg = svg_header();

    let (min_x, max_x) = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.x))
        .fold((i64::MAX, i64::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
    let x_span = (max_x.saturating_sub(min_x)).max(1) as f64;

    let plot_w = CHART_WIDTH - 2.0 * CHART_PADDING;
    let plot_h = CHART_HEIGHT - 2.0 * CHART_PADDING;

    for (idx, s) in series.iter().enumerate() {
        if s.points.is_empty() {
            continue;
        }

        let (min_y, max_y) = s
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });
        let y_span = if max_y > min_y { max_y - min_y } else { 1.0 };

        let coords: Vec<String> = s
            .points
            .iter()
            .map(|p| {
                let x = CHART_PADDING + (p.x.saturating_sub(min_x)) as f64 / x_span * plot_w;
                let y = CHART_HEIGHT - CHART_PADDING - (p.y - min_y) / y_span * plot_h;
                format!("{:.1},{:.1}", x, y)
            })
            .collect();

        let color = PALETTE[idx % PALETTE.len()];
        let _ = writeln!(
            svg,
            r#"  <polyline fill="none" stroke="{}" stroke-width="2" points="{}"><title>{}</title></polyline>"#,
            color,
            coords.join(" "),
            escape_xml(&s.name)
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" fill="{}" font-size="12">{}</text>"#,
            CHART_PADDING + idx as f64 * 100.0,
            CHART_PADDING / 2.0,
            color,
            escape_xml(&s.name)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render a donut chart as an SVG document
pub fn render_donut_svg(chart: &DonutChart) -> String {
    let mut svg = svg_header();

    let total: f64 = chart.series.iter().filter(|v| **v > 0.0).sum();
    let cx = CHART_WIDTH / 2.0;
    let cy = CHART_HEIGHT / 2.0;
    let radius = CHART_HEIGHT / 2.0 - CHART_PADDING;
    let mut angle = -std::f64::consts::FRAC_PI_2;

    if total > 0.0 {
        for (idx, value) in chart.series.iter().enumerate() {
            if *value <= 0.0 {
                continue;
            }
            let sweep = value / total * std::f64::consts::TAU;
            let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
            let end = angle + sweep;
            let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
            let large_arc = if sweep > std::f64::consts::PI { 1 } else { 0 };
            let label = chart.labels.get(idx).map(String::as_str).unwrap_or("");

            let _ = writeln!(
                svg,
                r#"  <path d="M {:.1} {:.1} A {:.1} {:.1} 0 {} 1 {:.1} {:.1}" fill="none" stroke="{}" stroke-width="40"><title>{}: {}</title></path>"#,
                x1,
                y1,
                radius,
                radius,
                large_arc,
                x2,
                y2,
                PALETTE[idx % PALETTE.len()],
                escape_xml(label),
                value
            );
            angle = end;
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn svg_header() -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::PageStat;
    use crate::dashboard::view::ChartPoint;
    use tempfile::tempdir;

    fn pages() -> Vec<PageStat> {
        vec![
            PageStat {
                url: "/home".to_string(),
                views: 8245.0,
                avg_time: 135.0,
                bounce_rate: 25.0,
            },
            PageStat {
                url: "/blog".to_string(),
                views: 2845.0,
                avg_time: 250.0,
                bounce_rate: 22.0,
            },
        ]
    }

    #[test]
    fn test_render_rows_csv() {
        let csv = render_rows(&pages(), ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "url,views,avgTime,bounceRate");
        assert_eq!(lines.next().unwrap(), "/home,8245,135,25.0");
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_render_rows_json_is_pretty() {
        let json = render_rows(&pages(), ExportFormat::Json).unwrap();
        assert!(json.starts_with("[\n  {"));
        let parsed: Vec<PageStat> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pages());
    }

    #[test]
    fn test_export_filename_has_timestamp() {
        let name = export_filename("top-pages", "json");
        assert!(name.starts_with("top-pages-"));
        assert!(name.ends_with(".json"));
        // top-pages-YYYYMMDD_HHMMSS.json
        assert_eq!(name.len(), "top-pages-".len() + 15 + ".json".len());
    }

    #[test]
    fn test_exporter_writes_files() {
        let dir = tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("exports"));

        let path = exporter
            .export_rows("top-pages", &pages(), ExportFormat::Csv)
            .unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "csv");

        let series = vec![ChartSeries {
            name: "Revenue".to_string(),
            points: vec![ChartPoint { x: 0, y: 1.0 }, ChartPoint { x: 10, y: 3.0 }],
        }];
        let svg_path = exporter.export_line_chart("revenueChart", &series).unwrap();
        let svg = std::fs::read_to_string(svg_path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("40.0,360.0"));
        assert!(svg.contains("760.0,40.0"));
    }

    #[test]
    fn test_donut_has_one_arc_per_positive_slice() {
        let chart = DonutChart {
            labels: vec!["a".into(), "b".into(), "c".into()],
            series: vec![50.0, 0.0, 50.0],
        };
        let svg = render_donut_svg(&chart);
        assert_eq!(svg.matches("<path").count(), 2);
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
