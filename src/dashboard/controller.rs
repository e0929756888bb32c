//! Analytics Dashboard Controller
//!
//! Translates dashboard events (date range, presets, search, panel actions)
//! into Data Service calls and rebuilds the render model.

use chrono::{Duration, NaiveDate};
use std::path::PathBuf;

use super::export::{ExportFormat, Exporter};
use super::preset::DatePreset;
use super::view::DashboardView;
use crate::analytics::{AnalyticsResult, AnalyticsService, DateRange, Snapshot};

/// Days covered by the window a fresh dashboard opens with
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Dashboard panels that carry refresh/download/more actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    RevenueChart,
    DemographicsChart,
    TrafficSources,
    TopPages,
}

impl Panel {
    /// Identifier used in export filenames
    pub fn id(&self) -> &'static str {
        match self {
            Panel::RevenueChart => "revenueChart",
            Panel::DemographicsChart => "demographicsChart",
            Panel::TrafficSources => "traffic-sources",
            Panel::TopPages => "top-pages",
        }
    }
}

/// Buttons on each panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Refresh,
    Download,
    More,
}

/// What a panel action produced
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Refreshed(Box<DashboardView>),
    Exported(PathBuf),
    /// Download requested but there was nothing to export
    NothingToExport,
    /// The options menu for a panel was requested
    OptionsRequested(Panel),
}

/// Owns the dashboard's date window, search query and last rendered view
pub struct DashboardController {
    service: AnalyticsService,
    exporter: Exporter,
    range: DateRange,
    active_preset: Option<DatePreset>,
    last_view: Option<DashboardView>,
}

impl DashboardController {
    /// Open on the last [`DEFAULT_WINDOW_DAYS`] days ending `today`
    pub fn new(service: AnalyticsService, exporter: Exporter, today: NaiveDate) -> Self {
        let range = DateRange::from_dates(today - Duration::days(DEFAULT_WINDOW_DAYS), today);

        Self {
            service,
            exporter,
            range,
            active_preset: None,
            last_view: None,
        }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn active_preset(&self) -> Option<DatePreset> {
        self.active_preset
    }

    /// The most recently rendered view, if any load succeeded
    pub fn last_view(&self) -> Option<&DashboardView> {
        self.last_view.as_ref()
    }

    /// Fetch the current window and rebuild the view
    pub fn load(&mut self) -> AnalyticsResult<DashboardView> {
        match self.service.get_analytics(&self.range) {
            Ok(snapshot) => Ok(self.render(&snapshot)),
            Err(e) => {
                tracing::error!(error = %e, "Error loading analytics");
                Err(e)
            }
        }
    }

    /// Apply a manually entered range; clears the active preset
    pub fn set_date_range(
        &mut self,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> AnalyticsResult<DashboardView> {
        self.range = DateRange::new(start, end);
        self.active_preset = None;
        self.load()
    }

    /// Apply a preset relative to `today`
    pub fn apply_preset(
        &mut self,
        preset: DatePreset,
        today: NaiveDate,
    ) -> AnalyticsResult<DashboardView> {
        self.range = preset.range(today);
        self.active_preset = Some(preset);
        tracing::debug!(preset = %preset, start = %self.range.start, end = %self.range.end, "Preset applied");
        self.load()
    }

    /// Filter top pages and traffic sources by a search query
    ///
    /// The data is re-fetched for the current date window each time. An empty
    /// query restores the unfiltered view.
    pub fn search(&mut self, query: &str) -> AnalyticsResult<DashboardView> {
        if query.is_empty() {
            return self.load();
        }

        match self.service.get_analytics(&self.range) {
            Ok(snapshot) => {
                let filtered = apply_search(snapshot, query);
                Ok(self.render(&filtered))
            }
            Err(e) => {
                tracing::error!(error = %e, query = %query, "Error during search");
                Err(e)
            }
        }
    }

    /// Handle a refresh/download/more button on a panel
    pub fn handle_action(
        &mut self,
        panel: Panel,
        action: PanelAction,
    ) -> AnalyticsResult<ActionOutcome> {
        match action {
            PanelAction::Refresh => Ok(ActionOutcome::Refreshed(Box::new(self.load()?))),
            PanelAction::Download => self.download(panel, ExportFormat::Json),
            PanelAction::More => {
                tracing::info!(panel = panel.id(), "Options requested");
                Ok(ActionOutcome::OptionsRequested(panel))
            }
        }
    }

    /// Export a panel
    ///
    /// Charts export the last rendered view as SVG. Tables export the stored
    /// snapshot; nothing is written when no snapshot has been stored.
    pub fn download(&self, panel: Panel, format: ExportFormat) -> AnalyticsResult<ActionOutcome> {
        let path = match panel {
            Panel::RevenueChart => match &self.last_view {
                Some(view) => self.exporter.export_line_chart(panel.id(), &view.revenue_chart)?,
                None => return Ok(ActionOutcome::NothingToExport),
            },
            Panel::DemographicsChart => match &self.last_view {
                Some(view) => self
                    .exporter
                    .export_donut_chart(panel.id(), &view.demographics_chart)?,
                None => return Ok(ActionOutcome::NothingToExport),
            },
            Panel::TrafficSources => match self.service.stored_snapshot()? {
                Some(snapshot) => {
                    self.exporter
                        .export_rows(panel.id(), &snapshot.traffic_sources, format)?
                }
                None => return Ok(ActionOutcome::NothingToExport),
            },
            Panel::TopPages => match self.service.stored_snapshot()? {
                Some(snapshot) => self.exporter.export_rows(panel.id(), &snapshot.top_pages, format)?,
                None => return Ok(ActionOutcome::NothingToExport),
            },
        };

        Ok(ActionOutcome::Exported(path))
    }

    fn render(&mut self, snapshot: &Snapshot) -> DashboardView {
        let view = DashboardView::from_snapshot(snapshot);
        self.last_view = Some(view.clone());
        view
    }
}

/// Keep top pages whose URL, and traffic sources whose name, contain `query`
/// (case-insensitive)
pub fn apply_search(mut snapshot: Snapshot, query: &str) -> Snapshot {
    let needle = query.to_lowercase();

    snapshot
        .top_pages
        .retain(|page| page.url.to_lowercase().contains(&needle));
    snapshot
        .traffic_sources
        .retain(|source| source.name.to_lowercase().contains(&needle));

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{initial_data, MemoryStore, SnapshotStore};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn snapshot() -> Snapshot {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        initial_data(now, &mut StdRng::seed_from_u64(3))
    }

    fn controller(stored: bool, out_dir: &std::path::Path) -> DashboardController {
        let store = MemoryStore::new();
        if stored {
            store.save(&snapshot()).unwrap();
        }
        let service = AnalyticsService::new(Arc::new(store));
        DashboardController::new(service, Exporter::new(out_dir), today())
    }

    #[test]
    fn test_initial_window_is_last_30_days() {
        let dir = tempdir().unwrap();
        let c = controller(true, dir.path());
        assert_eq!(c.range(), &DateRange::new("2024-05-16", "2024-06-15"));
        assert!(c.active_preset().is_none());
        assert!(c.last_view().is_none());
    }

    #[test]
    fn test_load_filters_series_to_window() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());

        let view = c.load().unwrap();
        // Only the point dated 2024-06-15 falls in the default window
        assert_eq!(view.revenue_chart[0].points.len(), 1);
        assert_eq!(view.top_pages.len(), 5);
        assert!(c.last_view().is_some());
    }

    #[test]
    fn test_preset_then_manual_range() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());

        c.apply_preset(DatePreset::LastMonth, today()).unwrap();
        assert_eq!(c.active_preset(), Some(DatePreset::LastMonth));
        assert_eq!(c.range(), &DateRange::new("2024-05-01", "2024-05-31"));

        let view = c.set_date_range("2023-01-01", "2024-12-31").unwrap();
        assert!(c.active_preset().is_none());
        assert_eq!(view.revenue_chart[0].points.len(), 12);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());

        let view = c.search("BLOG").unwrap();
        assert_eq!(view.top_pages.len(), 1);
        assert_eq!(view.top_pages[0].url, "/blog");
        assert!(view.traffic_sources.is_empty());

        let view = c.search("media").unwrap();
        assert_eq!(view.traffic_sources.len(), 1);
        assert_eq!(view.traffic_sources[0].name, "Social Media");

        // "e" matches both tables
        let view = c.search("e").unwrap();
        assert_eq!(view.top_pages.len(), 1); // /home
        assert!(view.traffic_sources.len() >= 3);
    }

    #[test]
    fn test_empty_search_restores_everything() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());
        c.search("blog").unwrap();
        let view = c.search("").unwrap();
        assert_eq!(view.top_pages.len(), 5);
        assert_eq!(view.traffic_sources.len(), 5);
    }

    #[test]
    fn test_search_uses_current_window() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());
        c.set_date_range("2030-01-01", "2030-01-31").unwrap();
        let view = c.search("home").unwrap();
        assert!(view.revenue_chart[0].points.is_empty());
        assert_eq!(view.top_pages.len(), 1);
    }

    #[test]
    fn test_apply_search_on_snapshot() {
        let filtered = apply_search(snapshot(), "/CON");
        assert_eq!(filtered.top_pages.len(), 1);
        assert_eq!(filtered.top_pages[0].url, "/contact");
        assert_eq!(filtered.revenue_data.len(), 12);
    }

    #[test]
    fn test_download_tables_need_stored_snapshot() {
        let dir = tempdir().unwrap();
        let c = controller(false, dir.path());
        assert_eq!(
            c.download(Panel::TopPages, ExportFormat::Json).unwrap(),
            ActionOutcome::NothingToExport
        );

        let c = controller(true, dir.path());
        match c.download(Panel::TrafficSources, ExportFormat::Json).unwrap() {
            ActionOutcome::Exported(path) => {
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                assert!(name.starts_with("traffic-sources-"));
                let body = std::fs::read_to_string(&path).unwrap();
                assert!(body.contains("Organic Search"));
            }
            other => panic!("Expected export, got {:?}", other),
        }
    }

    #[test]
    fn test_chart_download_needs_a_view() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());
        assert_eq!(
            c.handle_action(Panel::RevenueChart, PanelAction::Download)
                .unwrap(),
            ActionOutcome::NothingToExport
        );

        c.load().unwrap();
        match c
            .handle_action(Panel::DemographicsChart, PanelAction::Download)
            .unwrap()
        {
            ActionOutcome::Exported(path) => {
                assert_eq!(path.extension().unwrap(), "svg");
            }
            other => panic!("Expected export, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_and_more_actions() {
        let dir = tempdir().unwrap();
        let mut c = controller(true, dir.path());
        assert!(matches!(
            c.handle_action(Panel::TopPages, PanelAction::Refresh).unwrap(),
            ActionOutcome::Refreshed(_)
        ));
        assert_eq!(
            c.handle_action(Panel::TrafficSources, PanelAction::More)
                .unwrap(),
            ActionOutcome::OptionsRequested(Panel::TrafficSources)
        );
    }
}
