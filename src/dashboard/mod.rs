//! Analytics Dashboard
//!
//! Date windows, presets, search and panel actions over the Analytics Data
//! Service, producing a render model any front-end can draw.
//!
//! ## Modules
//!
//! - **preset**: Named date windows relative to today
//! - **view**: KPI cards, chart series and table rows
//! - **export**: SVG, JSON and CSV file exports
//! - **controller**: `DashboardController` tying the above together

mod controller;
mod export;
mod preset;
mod view;

pub use controller::{
    apply_search, ActionOutcome, DashboardController, Panel, PanelAction, DEFAULT_WINDOW_DAYS,
};
pub use export::{
    export_filename, render_donut_svg, render_line_chart_svg, render_rows, ExportFormat, Exporter,
};
pub use preset::{DatePreset, UnknownPreset};
pub use view::{
    format_duration, format_number, traffic_icon, BounceClass, ChartPoint, ChartSeries,
    DashboardView, DonutChart, KpiCard, KpiFormat, PageRow, TrafficRow, TrendDirection,
};
