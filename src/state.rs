use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use spectra_workbench::data::model::{SpectralDataset, Spectrum};
use spectra_workbench::data::report::ReportValue;
use spectra_workbench::data::selection::{init_selection_state, selected_indices, SelectionState};
use spectra_workbench::outlier::{AmplitudeRange, OutlierDetector, Swapped};
use spectra_workbench::processing::baseline::{BaselineCorrection, BaselineMethod};
use spectra_workbench::processing::savitzky_golay::SavitzkyGolay;
use spectra_workbench::processing::scatter::{
    MultiplicativeScatterCorrection, RangeBased, StandardNormalVariate,
};
use spectra_workbench::processing::{self, SpectrumFilter};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Preprocessing choice
// ---------------------------------------------------------------------------

/// Preprocessing applied to every spectrum before plotting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preprocessing {
    #[default]
    None,
    Smoothing,
    FirstDerivative,
    Snv,
    Msc,
    LinearBaseline,
}

impl Preprocessing {
    pub const ALL: [Preprocessing; 6] = [
        Preprocessing::None,
        Preprocessing::Smoothing,
        Preprocessing::FirstDerivative,
        Preprocessing::Snv,
        Preprocessing::Msc,
        Preprocessing::LinearBaseline,
    ];

    /// Build the filter, `None` meaning raw spectra.
    fn build(&self, half_window: usize) -> processing::Result<Option<Box<dyn SpectrumFilter>>> {
        let filter: Box<dyn SpectrumFilter> = match self {
            Preprocessing::None => return Ok(None),
            Preprocessing::Smoothing => Box::new(SavitzkyGolay::smoothing(2, half_window)?),
            Preprocessing::FirstDerivative => {
                Box::new(SavitzkyGolay::new(2, 1, half_window, half_window)?)
            }
            Preprocessing::Snv => Box::new(StandardNormalVariate),
            Preprocessing::Msc => Box::new(MultiplicativeScatterCorrection::new(RangeBased::full())),
            Preprocessing::LinearBaseline => {
                Box::new(BaselineCorrection::new(BaselineMethod::Linear))
            }
        };
        Ok(Some(filter))
    }
}

impl fmt::Display for Preprocessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Preprocessing::None => "None",
            Preprocessing::Smoothing => "Savitzky-Golay smoothing",
            Preprocessing::FirstDerivative => "1st derivative",
            Preprocessing::Snv => "SNV",
            Preprocessing::Msc => "MSC",
            Preprocessing::LinearBaseline => "Linear baseline",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<SpectralDataset>,

    /// Per-field value selections.
    pub selections: SelectionState,

    /// Indices of spectra passing the current selections (cached).
    pub visible_indices: Vec<usize>,

    /// Which report field is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,

    /// Scale each plotted spectrum to [0, 1].
    pub minmax_scaling: bool,

    /// Active preprocessing and its Savitzky-Golay half window.
    pub preprocessing: Preprocessing,
    pub half_window: usize,

    /// Preprocessed copy of each dataset spectrum; `None` where it failed.
    pub processed: Vec<Option<Spectrum>>,

    /// Envelope detector trained on a user-chosen reference set.
    pub envelope: Option<AmplitudeRange>,

    /// Whether outliers are detected and highlighted.
    pub detect_outliers: bool,

    /// Violations per dataset index.
    pub outliers: BTreeMap<usize, Vec<String>>,

    /// Spectrum whose report is shown in the bottom panel.
    pub inspected: Option<usize>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            selections: SelectionState::default(),
            visible_indices: Vec::new(),
            color_column: None,
            color_map: None,
            status_message: None,
            loading: false,
            minmax_scaling: false,
            preprocessing: Preprocessing::None,
            half_window: 3,
            processed: Vec::new(),
            envelope: None,
            detect_outliers: false,
            outliers: BTreeMap::new(),
            inspected: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise selections and colour.
    pub fn set_dataset(&mut self, dataset: SpectralDataset) {
        self.selections = init_selection_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();

        // Default colour field: first report field (if any).
        self.color_column = dataset.column_names.first().cloned();
        self.rebuild_color_map(&dataset);

        self.dataset = Some(dataset);
        self.envelope = None;
        self.inspected = None;
        self.status_message = None;
        self.loading = false;
        self.reprocess();
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, dataset: &SpectralDataset) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    /// Recompute `visible_indices` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = selected_indices(ds, &self.selections);
        }
    }

    /// Set colour field and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(ds) = self.dataset.take() {
            self.rebuild_color_map(&ds);
            self.dataset = Some(ds);
        }
    }

    /// Toggle a single report value in a field's selection.
    pub fn toggle_selection_value(&mut self, column: &str, value: &ReportValue) {
        let selected = self.selections.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values of a field.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(column) {
                self.selections.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values of a field.
    pub fn select_none(&mut self, column: &str) {
        self.selections.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    /// The spectrum to plot for a dataset index: preprocessed if available.
    pub fn display_spectrum(&self, idx: usize) -> Option<&Spectrum> {
        match self.preprocessing {
            Preprocessing::None => self.dataset.as_ref()?.spectra.get(idx),
            _ => self.processed.get(idx)?.as_ref(),
        }
    }

    /// Re-run preprocessing on the whole dataset, then outlier detection.
    pub fn reprocess(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };

        self.processed = match self.preprocessing.build(self.half_window) {
            Ok(None) => Vec::new(),
            Ok(Some(mut filter)) => match apply_filter(filter.as_mut(), &ds.spectra) {
                Ok((processed, 0)) => processed,
                Ok((processed, failures)) => {
                    self.status_message =
                        Some(format!("{failures} spectra could not be preprocessed"));
                    processed
                }
                Err(e) => {
                    log::error!("training {} failed: {e}", filter.name());
                    self.status_message = Some(format!("Error: {e}"));
                    vec![None; ds.len()]
                }
            },
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
                Vec::new()
            }
        };
        self.redetect();
    }

    /// Train the envelope detector on the currently visible spectra.
    pub fn train_envelope(&mut self) {
        let reference: Vec<Spectrum> = self
            .visible_indices
            .iter()
            .filter_map(|&i| self.display_spectrum(i).cloned())
            .collect();
        let mut detector = AmplitudeRange::new();
        match detector.train(&reference) {
            Ok(()) => {
                self.envelope = Some(detector);
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
        self.redetect();
    }

    /// Recompute outliers over all spectra.
    pub fn redetect(&mut self) {
        self.outliers.clear();
        if !self.detect_outliers {
            return;
        }
        let n = self.dataset.as_ref().map_or(0, SpectralDataset::len);
        let swapped = Swapped::default();
        let mut found = BTreeMap::new();
        for idx in 0..n {
            let Some(sp) = self.display_spectrum(idx) else {
                continue;
            };
            let mut violations = Vec::new();
            let detectors: [Option<&dyn OutlierDetector>; 2] = [
                self.envelope.as_ref().map(|d| d as &dyn OutlierDetector),
                Some(&swapped as &dyn OutlierDetector),
            ];
            for d in detectors.into_iter().flatten() {
                match d.detect(sp) {
                    Ok(v) => violations.extend(v.into_iter().map(|v| format!("{}: {v}", d.name()))),
                    Err(e) => log::warn!("{} failed on '{}': {e}", d.name(), sp.id),
                }
            }
            if !violations.is_empty() {
                found.insert(idx, violations);
            }
        }
        log::info!("{} of {n} spectra flagged as outliers", found.len());
        self.outliers = found;
    }

    /// Spectra currently visible, as displayed (for export).
    pub fn visible_display_spectra(&self) -> Vec<Spectrum> {
        self.visible_indices
            .iter()
            .filter_map(|&i| self.display_spectrum(i).cloned())
            .collect()
    }
}

/// Train `filter` on `spectra` if needed, then apply it to each spectrum.
/// Returns the per-spectrum results and the number of failures.
fn apply_filter(
    filter: &mut dyn SpectrumFilter,
    spectra: &[Spectrum],
) -> processing::Result<(Vec<Option<Spectrum>>, usize)> {
    if filter.requires_training() {
        filter.train(spectra)?;
    }
    let mut failures = 0;
    let processed = spectra
        .iter()
        .map(|sp| match filter.filter(sp) {
            Ok(out) => Some(out),
            Err(e) => {
                log::warn!("{} failed on '{}': {e}", filter.name(), sp.id);
                failures += 1;
                None
            }
        })
        .collect();
    Ok((processed, failures))
}
