//! Per-date analysis session.
//!
//! [`AnalysisSession`] fetches the available dates, loads one date's dataset at
//! a time and keeps the derived view state consistent with it: the histogram
//! column and its bins, the zoom selection, the time-series filter and the
//! series visibility flags. Any change of dataset or histogram column rebuilds
//! the dependent state from the new column list.

use std::sync::Arc;

use serde::Serialize;

use super::binning::{self, HistogramBin};
use super::date_format::DateFormatter;
use super::selection::{SelectionState, ZoomSelection};
use super::statistics::{filter_stats, ColumnFilter};
use super::visibility::SeriesVisibility;
use crate::api::ColumnStats;
use crate::client::{AnalysisService, ClientConfig, ClientError, ClientResult};
use crate::models::{DateDataset, DateOption};

/// Everything needed to draw the histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramView {
    pub column: String,
    pub bins: Vec<HistogramBin>,
    /// Visible value domain
    pub domain: (f64, f64),
    pub state: SelectionState,
    /// Bins highlighted by an in-progress drag
    pub preview: Option<(usize, usize)>,
    /// Bins covered by the committed zoom
    pub committed: Option<(usize, usize)>,
    pub total_count: usize,
    pub stats: Option<ColumnStats>,
}

impl HistogramView {
    /// Bins inside the committed zoom, or all bins when not zoomed.
    pub fn visible_bins(&self) -> &[HistogramBin] {
        match self.committed {
            Some((lo, hi)) if hi < self.bins.len() => &self.bins[lo..=hi],
            _ => &self.bins,
        }
    }
}

/// One sample row of the time-series chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: String,
    /// `HH:MM:SS` axis label
    pub label: String,
    /// One value per plotted series, `None` where the row has no number
    pub values: Vec<Option<f64>>,
}

/// Everything needed to draw the time-series chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesView {
    /// Plotted series, in column order
    pub series: Vec<String>,
    pub points: Vec<SeriesPoint>,
    /// Average of the single plotted series
    pub reference_line: Option<f64>,
}

/// Interactive analysis over the merged per-day data.
pub struct AnalysisSession {
    service: Arc<dyn AnalysisService>,
    formatter: DateFormatter,
    default_bin_count: usize,

    dates: Vec<DateOption>,
    selected_date: Option<DateOption>,
    dataset: Option<DateDataset>,
    columns: Vec<String>,

    histogram_column: Option<String>,
    bin_count: usize,
    bins: Vec<HistogramBin>,
    zoom: ZoomSelection,

    series_filter: ColumnFilter,
    visibility: SeriesVisibility,

    loading_dates: bool,
    loading_dataset: bool,
    last_error: Option<String>,
}

impl AnalysisSession {
    pub fn new(service: Arc<dyn AnalysisService>, formatter: DateFormatter) -> Self {
        Self::with_bin_count(service, formatter, binning::DEFAULT_BIN_COUNT)
    }

    pub fn from_config(service: Arc<dyn AnalysisService>, config: &ClientConfig) -> Self {
        Self::with_bin_count(
            service,
            DateFormatter::new(&config.display.locale),
            config.display.default_bin_count,
        )
    }

    fn with_bin_count(
        service: Arc<dyn AnalysisService>,
        formatter: DateFormatter,
        bin_count: usize,
    ) -> Self {
        let bin_count = binning::clamp_bin_count(bin_count);
        Self {
            service,
            formatter,
            default_bin_count: bin_count,
            dates: Vec::new(),
            selected_date: None,
            dataset: None,
            columns: Vec::new(),
            histogram_column: None,
            bin_count,
            bins: Vec::new(),
            zoom: ZoomSelection::empty(),
            series_filter: ColumnFilter::All,
            visibility: SeriesVisibility::default(),
            loading_dates: false,
            loading_dataset: false,
            last_error: None,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the available dates. On failure the list is left empty and the
    /// error recorded.
    pub async fn load_dates(&mut self) -> ClientResult<()> {
        self.loading_dates = true;
        let result = self.service.available_dates().await;
        self.loading_dates = false;

        match result {
            Ok(dates) => {
                log::info!("{} dates available", dates.len());
                self.dates = self.formatter.date_options(&dates);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to load available dates: {}", err);
                self.dates.clear();
                Err(self.record(err))
            }
        }
    }

    /// Load one date's dataset, replacing the current one and resetting the
    /// view state derived from it. On failure no dataset is kept.
    pub async fn select_date(&mut self, option: &DateOption) -> ClientResult<()> {
        self.selected_date = Some(option.clone());
        self.loading_dataset = true;
        let result = self.service.data_by_date(&option.date).await;
        self.loading_dataset = false;

        match result {
            Ok(response) => {
                let dataset = DateDataset::from(response);
                log::info!(
                    "Loaded {} rows for {} ({} columns)",
                    dataset.rows.len(),
                    option.date,
                    dataset.columns().len()
                );
                self.install_dataset(dataset);
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to load data for {}: {}", option.date, err);
                self.install_dataset(DateDataset::default());
                self.dataset = None;
                Err(self.record(err))
            }
        }
    }

    /// Clear all merged data on the service. On success the session starts
    /// over and the caller may leave the analysis view; on failure nothing
    /// changes and the caller must stay.
    pub async fn clear_and_return(&mut self) -> ClientResult<()> {
        match self.service.clear_data().await {
            Ok(()) => {
                log::info!("Cleared merged data");
                let service = Arc::clone(&self.service);
                *self = Self::with_bin_count(service, self.formatter, self.default_bin_count);
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to clear data: {}", err);
                Err(self.record(err))
            }
        }
    }

    fn install_dataset(&mut self, dataset: DateDataset) {
        self.columns = dataset.columns();
        self.dataset = Some(dataset);
        self.histogram_column = self.columns.first().cloned();
        self.visibility.rebuild(&self.columns);
        if let ColumnFilter::Column(name) = &self.series_filter {
            if !self.columns.contains(name) {
                self.series_filter = ColumnFilter::All;
            }
        }
        self.rebuild_histogram();
    }

    fn record(&mut self, err: ClientError) -> ClientError {
        self.last_error = Some(err.user_message());
        err
    }

    // =========================================================================
    // Histogram
    // =========================================================================

    /// Switch the histogram to `column`, showing every series again.
    /// Unknown columns are ignored.
    pub fn select_column(&mut self, column: &str) -> bool {
        if !self.columns.iter().any(|c| c == column) {
            log::debug!("Ignoring unknown histogram column '{}'", column);
            return false;
        }
        self.histogram_column = Some(column.to_string());
        self.visibility.rebuild(&self.columns);
        self.rebuild_histogram();
        true
    }

    /// Change the number of bins, clamped to the supported range. The zoom
    /// is reset since bin indices change meaning.
    pub fn set_bin_count(&mut self, bin_count: usize) -> usize {
        self.bin_count = binning::clamp_bin_count(bin_count);
        self.rebuild_histogram();
        self.bin_count
    }

    pub fn begin_drag(&mut self, bin: usize) {
        self.zoom.begin_drag(bin);
    }

    pub fn update_drag(&mut self, bin: usize) {
        self.zoom.update_drag(bin);
    }

    pub fn end_drag(&mut self) -> SelectionState {
        self.zoom.end_drag(&self.bins)
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset();
    }

    fn rebuild_histogram(&mut self) {
        let (bins, zoom) = match (&self.dataset, &self.histogram_column) {
            (Some(dataset), Some(column)) => {
                let values = dataset.column_values(column);
                let bins = binning::compute_histogram(&values, self.bin_count);
                let zoom = dataset
                    .value_range(column)
                    .map(|(lo, hi)| ZoomSelection::new(lo, hi))
                    .unwrap_or_default();
                (bins, zoom)
            }
            _ => (Vec::new(), ZoomSelection::empty()),
        };
        self.bins = bins;
        self.zoom = zoom;
    }

    pub fn histogram_view(&self) -> Option<HistogramView> {
        let column = self.histogram_column.clone()?;
        let stats = self
            .dataset
            .as_ref()
            .and_then(|d| d.stats.get(&column))
            .copied();
        Some(HistogramView {
            column,
            bins: self.bins.clone(),
            domain: self.zoom.domain(),
            state: self.zoom.state(),
            preview: self.zoom.preview(),
            committed: self.zoom.committed_bins(),
            total_count: binning::total_count(&self.bins),
            stats,
        })
    }

    // =========================================================================
    // Time series
    // =========================================================================

    /// Plot every visible column (`All`) or a single one.
    pub fn set_series_filter(&mut self, filter: ColumnFilter) -> bool {
        if let ColumnFilter::Column(name) = &filter {
            if !self.columns.contains(name) {
                log::debug!("Ignoring unknown series filter '{}'", name);
                return false;
            }
        }
        self.series_filter = filter;
        true
    }

    pub fn set_series_visible(&mut self, column: &str, visible: bool) {
        self.visibility.set_visible(column, visible);
    }

    pub fn toggle_series(&mut self, column: &str) -> Option<bool> {
        self.visibility.toggle(column)
    }

    pub fn show_all_series(&mut self) {
        self.visibility.show_all();
    }

    pub fn hide_all_series(&mut self) {
        self.visibility.hide_all();
    }

    pub fn time_series_view(&self) -> Option<TimeSeriesView> {
        let dataset = self.dataset.as_ref()?;
        let series: Vec<String> = match &self.series_filter {
            ColumnFilter::All => self
                .visibility
                .visible_columns()
                .into_iter()
                .map(String::from)
                .collect(),
            ColumnFilter::Column(name) => vec![name.clone()],
        };

        let points = dataset
            .rows
            .iter()
            .map(|row| SeriesPoint {
                time: row.time.clone(),
                label: self.formatter.format_time_label(&row.time),
                values: series.iter().map(|s| row.numeric(s)).collect(),
            })
            .collect();

        let reference_line = match &self.series_filter {
            ColumnFilter::Column(name) => dataset
                .stats
                .get(name)
                .map(|s| s.avg)
                .filter(|avg| avg.is_finite()),
            ColumnFilter::All => None,
        };

        Some(TimeSeriesView {
            series,
            points,
            reference_line,
        })
    }

    /// Statistics rows under the current series filter; `None` when the
    /// filtered column has no statistics.
    pub fn statistics(&self) -> Option<Vec<(&str, &ColumnStats)>> {
        let dataset = self.dataset.as_ref()?;
        filter_stats(&dataset.stats, &self.columns, &self.series_filter)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dates(&self) -> &[DateOption] {
        &self.dates
    }

    pub fn selected_date(&self) -> Option<&DateOption> {
        self.selected_date.as_ref()
    }

    pub fn dataset(&self) -> Option<&DateDataset> {
        self.dataset.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn histogram_column(&self) -> Option<&str> {
        self.histogram_column.as_deref()
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn zoom(&self) -> &ZoomSelection {
        &self.zoom
    }

    pub fn series_filter(&self) -> &ColumnFilter {
        &self.series_filter
    }

    pub fn visibility(&self) -> &SeriesVisibility {
        &self.visibility
    }

    pub fn is_loading_dates(&self) -> bool {
        self.loading_dates
    }

    pub fn is_loading_dataset(&self) -> bool {
        self.loading_dataset
    }

    /// Message of the most recent failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DataRow, StatsMap};
    use crate::client::LocalAnalysisService;

    fn day(date: &str) -> DateDataset {
        let rows = vec![
            DataRow::new(format!("{}T08:00:00", date))
                .with_value("temp", 10.0)
                .with_value("humidity", 40.0),
            DataRow::new(format!("{}T08:00:30", date))
                .with_value("temp", 20.0)
                .with_value("humidity", 45.0),
            DataRow::new(format!("{}T08:01:00", date))
                .with_value("temp", 30.0)
                .with_value("humidity", 50.0),
        ];
        let mut stats = StatsMap::new();
        stats.insert("temp".into(), ColumnStats::new(20.0, 10.0, 30.0, 8.16));
        DateDataset::new(date, rows, stats)
    }

    async fn loaded() -> (Arc<LocalAnalysisService>, AnalysisSession) {
        let service = Arc::new(LocalAnalysisService::new());
        service.seed_dataset(day("2024-01-15"));
        let mut session = AnalysisSession::new(service.clone(), DateFormatter::default());
        session.load_dates().await.unwrap();
        let first = session.dates()[0].clone();
        session.select_date(&first).await.unwrap();
        (service, session)
    }

    #[tokio::test]
    async fn test_load_dates_formats_labels() {
        let (_, session) = loaded().await;
        assert_eq!(session.dates().len(), 1);
        assert_eq!(session.dates()[0].display_name, "15 de enero de 2024");
        assert!(!session.is_loading_dates());
    }

    #[tokio::test]
    async fn test_load_dates_failure_is_recorded() {
        let service = Arc::new(LocalAnalysisService::new());
        service.fail_with("available_dates", "Internal Server Error");
        let mut session = AnalysisSession::new(service, DateFormatter::default());

        assert!(session.load_dates().await.is_err());
        assert!(session.dates().is_empty());
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_select_date_resets_view_state() {
        let (_, session) = loaded().await;
        assert_eq!(session.columns(), ["temp", "humidity"]);
        assert_eq!(session.histogram_column(), Some("temp"));
        assert_eq!(session.zoom().domain(), (10.0, 30.0));
        assert!(session.visibility().all_visible());
        assert!(!session.is_loading_dataset());
    }

    #[tokio::test]
    async fn test_select_unknown_date_leaves_no_dataset() {
        let (_, mut session) = loaded().await;
        let missing = DateOption::new("2030-01-01", "");
        assert!(session.select_date(&missing).await.is_err());
        assert!(session.dataset().is_none());
        assert!(session.columns().is_empty());
        assert!(session.histogram_view().is_none());
        assert!(session.last_error().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_changing_column_resets_zoom() {
        let (_, mut session) = loaded().await;
        session.set_bin_count(5);
        session.begin_drag(1);
        session.update_drag(3);
        assert_eq!(session.end_drag(), SelectionState::Committed);
        session.hide_all_series();

        assert!(session.select_column("humidity"));
        assert_eq!(session.zoom().state(), SelectionState::Idle);
        assert_eq!(session.zoom().domain(), (40.0, 50.0));
        assert!(session.visibility().all_visible());

        session.set_series_visible("temp", false);
        assert!(!session.select_column("nope"));
        assert_eq!(session.histogram_column(), Some("humidity"));
        // ignored switches leave visibility alone
        assert!(!session.visibility().is_visible("temp"));
    }

    #[tokio::test]
    async fn test_histogram_view_with_zoom() {
        let (_, mut session) = loaded().await;
        assert_eq!(session.set_bin_count(1), binning::MIN_BIN_COUNT);

        session.begin_drag(0);
        session.update_drag(1);
        session.end_drag();

        let view = session.histogram_view().unwrap();
        assert_eq!(view.bins.len(), 5);
        assert_eq!(view.total_count, 3);
        assert_eq!(view.committed, Some((0, 1)));
        assert_eq!(view.domain, (10.0, 18.0));
        assert_eq!(view.visible_bins().len(), 2);
        assert_eq!(view.stats.unwrap().avg, 20.0);

        session.reset_zoom();
        assert_eq!(session.histogram_view().unwrap().domain, (10.0, 30.0));
    }

    #[tokio::test]
    async fn test_time_series_all_visible_columns() {
        let (_, mut session) = loaded().await;
        session.toggle_series("humidity");

        let view = session.time_series_view().unwrap();
        assert_eq!(view.series, vec!["temp"]);
        assert_eq!(view.points.len(), 3);
        assert_eq!(view.points[1].label, "08:00:30");
        assert_eq!(view.points[1].values, vec![Some(20.0)]);
        assert_eq!(view.reference_line, None);
    }

    #[tokio::test]
    async fn test_time_series_single_column_has_reference_line() {
        let (_, mut session) = loaded().await;
        assert!(session.set_series_filter(ColumnFilter::column("temp")));
        let view = session.time_series_view().unwrap();
        assert_eq!(view.series, vec!["temp"]);
        assert_eq!(view.reference_line, Some(20.0));

        assert!(!session.set_series_filter(ColumnFilter::column("ghost")));
    }

    #[tokio::test]
    async fn test_statistics_follow_filter() {
        let (_, mut session) = loaded().await;
        let all = session.statistics().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "temp");

        session.set_series_filter(ColumnFilter::column("humidity"));
        assert!(session.statistics().is_none());
    }

    #[tokio::test]
    async fn test_clear_and_return_success_resets_session() {
        let (service, mut session) = loaded().await;
        session.clear_and_return().await.unwrap();

        assert_eq!(service.clear_calls(), 1);
        assert!(session.dates().is_empty());
        assert!(session.dataset().is_none());
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_clear_and_return_failure_keeps_session() {
        let (service, mut session) = loaded().await;
        service.fail_with("clear_data", "Service Unavailable");

        let err = session.clear_and_return().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(session.dataset().is_some());
        assert_eq!(session.dates().len(), 1);
        assert_eq!(
            session.last_error(),
            Some("Server responded with 500 Service Unavailable")
        );
    }
}
