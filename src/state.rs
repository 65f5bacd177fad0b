use std::path::Path;

use crate::config::ViewerConfig;
use crate::data::error::ProjectionError;
use crate::data::filter::{
    parallel_view, sample_len, scatter_view, selected_count_text, ParallelSubset, ParallelView,
    ScatterView,
};
use crate::data::label::{apply_label, label_tally, ChannelTally};
use crate::data::model::{ChannelPair, LabelAction, RowId, UploadSummary, WideTable};
use crate::data::ingest_file;
use crate::selection::SelectionTool;

/// Shown for any upload that fails to load; details go to the log.
pub const UPLOAD_ERROR_MESSAGE: &str = "There was an error processing this file.";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Points picked in the scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub ids: Vec<RowId>,
    /// First-channel values of the picked rows, for the parallel-plot subset.
    pub x_values: Vec<f64>,
}

/// The full UI state, independent of rendering. One per window.
pub struct AppState {
    pub config: ViewerConfig,

    /// Wide table (None until a file loads successfully).
    pub dataset: Option<WideTable>,

    /// Facts about the last successful upload.
    pub upload: Option<UploadSummary>,

    pub sample: Option<String>,
    pub pair: ChannelPair,

    /// Active scatter selection.
    pub selection: Option<Selection>,

    pub tool: SelectionTool,

    /// Pointer path of the drag in progress on the scatter plot.
    pub drag_path: Vec<[f64; 2]>,

    pub label_action: LabelAction,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            pair: config.default_pair,
            tool: config.selection_tool,
            config,
            dataset: None,
            upload: None,
            sample: None,
            selection: None,
            drag_path: Vec::new(),
            label_action: LabelAction::default(),
            status_message: None,
        }
    }

    /// Load a file and replace the table. On failure the table is cleared.
    pub fn ingest(&mut self, path: &Path) {
        match ingest_file(path) {
            Ok((table, summary)) => {
                log::info!(
                    "Loaded {} ({} records) into {} partitions across samples {:?}",
                    summary.file_name,
                    summary.records,
                    table.len(),
                    table.samples()
                );
                if table.is_empty() {
                    log::warn!(
                        "{} has no partitions left after dropping rejected rows",
                        summary.file_name
                    );
                }
                self.set_dataset(table, summary);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.clear_dataset();
                self.status_message = Some(UPLOAD_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// Install a freshly built table and pick the default sample.
    pub fn set_dataset(&mut self, table: WideTable, summary: UploadSummary) {
        self.sample = self
            .config
            .default_sample
            .as_ref()
            .filter(|s| table.samples().contains(s))
            .or_else(|| table.samples().first())
            .cloned();
        self.dataset = Some(table);
        self.upload = Some(summary);
        self.selection = None;
        self.drag_path.clear();
        self.status_message = None;
    }

    pub fn clear_dataset(&mut self) {
        self.dataset = None;
        self.upload = None;
        self.sample = None;
        self.selection = None;
        self.drag_path.clear();
    }

    pub fn select_sample(&mut self, sample: String) {
        if self.sample.as_ref() != Some(&sample) {
            self.sample = Some(sample);
            self.selection = None;
        }
    }

    pub fn select_pair(&mut self, pair: ChannelPair) {
        if self.pair != pair {
            self.pair = pair;
            self.selection = None;
        }
    }

    /// Record the picked rows. An empty pick clears the selection.
    pub fn set_selection(&mut self, ids: Vec<RowId>) {
        let Some(table) = &self.dataset else {
            return;
        };
        if ids.is_empty() {
            self.selection = None;
            return;
        }
        let channel = self.pair.first();
        let x_values = ids
            .iter()
            .filter_map(|&id| table.row(id)?.value(channel))
            .collect();
        log::debug!("Selected {} points", ids.len());
        self.selection = Some(Selection { ids, x_values });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Apply the chosen label action to the selected rows.
    pub fn apply_label(&mut self) -> usize {
        match (&mut self.dataset, &self.selection) {
            (Some(table), Some(selection)) => apply_label(table, self.label_action, &selection.ids),
            _ => 0,
        }
    }

    /// Scatter projection of the selected sample; `None` without data.
    pub fn scatter(&self) -> Option<Result<ScatterView, ProjectionError>> {
        let (table, sample) = (self.dataset.as_ref()?, self.sample.as_deref()?);
        Some(scatter_view(table, sample, self.pair))
    }

    /// Parallel projection, restricted by the active selection if any.
    pub fn parallel(&self) -> Option<ParallelView> {
        let (table, sample) = (self.dataset.as_ref()?, self.sample.as_deref()?);
        let subset = self.selection.as_ref().map(|s| ParallelSubset {
            channel: self.pair.first(),
            x_values: s.x_values.clone(),
        });
        Some(parallel_view(table, sample, subset.as_ref()))
    }

    pub fn tally(&self) -> Vec<ChannelTally> {
        match (&self.dataset, self.sample.as_deref()) {
            (Some(table), Some(sample)) => label_tally(table, sample),
            _ => Vec::new(),
        }
    }

    /// "N data points selected out of M total data points." while a selection is active.
    pub fn selected_count_text(&self) -> Option<String> {
        let selection = self.selection.as_ref()?;
        let (table, sample) = (self.dataset.as_ref()?, self.sample.as_deref()?);
        Some(selected_count_text(selection.ids.len(), sample_len(table, sample)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Channel, Label};

    const CSV: &str = "\
Run,Sample,Index,Reject,Channel,C40
R1,A1,1,False,FAM,100
R1,A1,1,False,VIC,10
R1,A1,2,False,FAM,200
R1,A1,2,False,VIC,20
R1,A1,3,False,FAM,100
R1,A1,3,False,VIC,30
R1,B7,1,False,FAM,5
";

    fn loaded_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.csv");
        std::fs::write(&path, CSV).unwrap();

        let mut state = AppState::new(ViewerConfig::default());
        state.ingest(&path);
        (state, dir)
    }

    #[test]
    fn test_no_data_degrades_to_empty_views() {
        let state = AppState::new(ViewerConfig::default());
        assert!(state.scatter().is_none());
        assert!(state.parallel().is_none());
        assert!(state.tally().is_empty());
        assert!(state.selected_count_text().is_none());
    }

    #[test]
    fn test_ingest_success() {
        let (state, _dir) = loaded_state();
        assert_eq!(state.sample.as_deref(), Some("A1"));
        assert!(state.status_message.is_none());

        let upload = state.upload.as_ref().unwrap();
        assert_eq!(upload.file_name, "plate.csv");
        assert_eq!(upload.runs, vec!["R1".to_string()]);
        assert_eq!(upload.rows, 4);
        assert_eq!(upload.columns, 10);

        let scatter = state.scatter().unwrap().unwrap();
        assert_eq!(scatter.points.len(), 3);
    }

    #[test]
    fn test_failed_upload_resets_table() {
        let (mut state, dir) = loaded_state();
        let bad = dir.path().join("plate.txt");
        std::fs::write(&bad, CSV).unwrap();

        state.ingest(&bad);
        assert!(state.dataset.is_none());
        assert!(state.upload.is_none());
        assert_eq!(state.status_message.as_deref(), Some(UPLOAD_ERROR_MESSAGE));
        assert!(state.scatter().is_none());
    }

    #[test]
    fn test_default_sample_falls_back_to_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.csv");
        std::fs::write(&path, CSV).unwrap();

        let config = ViewerConfig {
            default_sample: Some("Z1".to_string()),
            ..Default::default()
        };
        let mut state = AppState::new(config);
        state.ingest(&path);
        assert_eq!(state.sample.as_deref(), Some("A1"));
    }

    #[test]
    fn test_selection_flows_to_parallel_and_labels() {
        let (mut state, _dir) = loaded_state();
        state.set_selection(vec![RowId(0)]);

        // Row 2 shares row 0's FAM value and joins the subset.
        let parallel = state.parallel().unwrap();
        let ids: Vec<RowId> = parallel.lines.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![RowId(0), RowId(2)]);
        assert_eq!(parallel.dimmed.len(), 1);
        assert_eq!(
            state.selected_count_text().as_deref(),
            Some("1 data points selected out of 3 total data points.")
        );

        // Labeling follows identity, not the value match.
        state.label_action = "FAM_labeling_Pos".parse().unwrap();
        assert_eq!(state.apply_label(), 1);
        let table = state.dataset.as_ref().unwrap();
        assert_eq!(table.rows()[0].label(Channel::Fam), Some(Label::Pos));
        assert_eq!(table.rows()[2].label(Channel::Fam), Some(Label::Neg));
        assert_eq!(state.tally()[0].positives, 1);
    }

    #[test]
    fn test_changing_sample_or_pair_clears_selection() {
        let (mut state, _dir) = loaded_state();
        state.set_selection(vec![RowId(1)]);
        state.select_pair("FAM_JUN".parse().unwrap());
        assert!(state.selection.is_none());

        state.set_selection(vec![RowId(1)]);
        state.select_sample("B7".to_string());
        assert!(state.selection.is_none());
        assert!(matches!(
            state.scatter(),
            Some(Err(ProjectionError::ChannelUnavailable { .. }))
        ));
    }

    #[test]
    fn test_empty_pick_clears_selection() {
        let (mut state, _dir) = loaded_state();
        state.set_selection(vec![RowId(1)]);
        state.set_selection(Vec::new());
        assert!(state.selection.is_none());
        assert_eq!(state.apply_label(), 0);
    }
}
