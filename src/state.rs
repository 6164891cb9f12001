use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::CategoryColors;
use crate::data::dashboard::{ChartSettings, DashboardPayload, compute_payloads};
use crate::data::filter::FilterSelection;
use crate::data::model::{Column, SurveyDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Every selection mutation goes through a method that ends in
/// [`AppState::refresh`], so the four charts are always recomputed together.
#[derive(Default)]
pub struct AppState {
    /// Cleaned dataset (None until a file is loaded). Read-only once set.
    pub dataset: Option<Arc<SurveyDataset>>,

    /// Current dropdown values.
    pub selection: FilterSelection,

    /// The four chart payloads for `selection`.
    pub payload: DashboardPayload,

    pub settings: ChartSettings,

    /// Region colours for the pie chart.
    pub region_colors: CategoryColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// File the dataset was read from.
    pub source: Option<PathBuf>,
}

const APP_NAME: &str = "Rusty Survey";

impl AppState {
    pub fn new(settings: ChartSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Ingest a newly loaded dataset, reset the filters, compute the charts.
    pub fn set_dataset(&mut self, dataset: SurveyDataset) {
        self.region_colors = CategoryColors::new(&dataset.options(Column::Region));
        self.dataset = Some(Arc::new(dataset));
        self.selection = FilterSelection::default();
        self.status_message = None;
        self.source = None;
        self.refresh();
    }

    /// Like [`AppState::set_dataset`], remembering where the data came from.
    pub fn set_dataset_from(&mut self, path: &Path, dataset: SurveyDataset) {
        self.set_dataset(dataset);
        self.source = Some(path.to_path_buf());
    }

    /// Window title: the source file name and how many records the filters keep.
    pub fn window_title(&self) -> String {
        let Some(ds) = &self.dataset else {
            return APP_NAME.to_string();
        };
        let file = self
            .source
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        format!(
            "{APP_NAME} – {file} ({} of {} records)",
            self.payload.matched_records,
            ds.len()
        )
    }

    /// Recompute all four payloads from the current selection.
    pub fn refresh(&mut self) {
        self.payload = match &self.dataset {
            Some(ds) => compute_payloads(ds, &self.selection, &self.settings),
            None => DashboardPayload::default(),
        };
    }

    /// Toggle one value of a multi-select filter.
    pub fn toggle_value(&mut self, column: Column, value: &str) {
        let Some(selected) = self.selection.values_mut(column) else {
            return;
        };
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refresh();
    }

    /// Empty a multi-select filter (no constraint).
    pub fn clear_values(&mut self, column: Column) {
        if let Some(selected) = self.selection.values_mut(column) {
            selected.clear();
        }
        self.refresh();
    }

    /// Choose the region scoping the locality chart; `None` means all regions.
    pub fn set_region(&mut self, region: Option<String>) {
        self.selection.region = region;
        self.refresh();
    }
}
