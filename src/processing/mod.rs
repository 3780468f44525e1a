//! Spectral signal processing: smoothing, scatter correction, baseline
//! correction, resampling, replicate merging and 3-way collapsing.
//!
//! Every spectrum filter implements [`SpectrumFilter`]. Filters never modify
//! their input; they clone the header and build a new point list.

pub mod baseline;
pub mod collapse;
pub mod merge;
pub mod resample;
pub mod savitzky_golay;
pub mod scatter;
pub mod smoothing;
pub mod stats;

use crate::data::model::Spectrum;

pub use stats::Statistic;

/// Errors raised by filters and reductions.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// A filter was configured with parameters it cannot work with
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The spectrum has fewer points than the operation needs
    #[error("spectrum '{id}' has {actual} points, at least {needed} required")]
    TooShort {
        id: String,
        needed: usize,
        actual: usize,
    },

    /// Two spectra expected to share their sampling differ in length
    #[error("length mismatch: expected {expected} points, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A trainable filter was used before training
    #[error("{0} has not been trained")]
    NotTrained(String),

    /// An operation that needs at least one input got none
    #[error("no input: {0}")]
    EmptyInput(String),

    /// The data does not allow the computation (e.g. zero variance)
    #[error("degenerate data: {0}")]
    Degenerate(String),
}

pub type Result<T> = std::result::Result<T, ProcessingError>;

// ---------------------------------------------------------------------------
// SpectrumFilter
// ---------------------------------------------------------------------------

/// A transformation from one spectrum to another.
pub trait SpectrumFilter: std::fmt::Debug {
    /// Short human-readable name, used in logs and reports.
    fn name(&self) -> &str;

    /// Produce the filtered copy of `spectrum`.
    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum>;

    /// Whether [`SpectrumFilter::train`] must run before filtering.
    fn requires_training(&self) -> bool {
        false
    }

    /// Learn whatever state the filter needs from a training set.
    fn train(&mut self, _spectra: &[Spectrum]) -> Result<()> {
        Ok(())
    }

    fn filter_all(&self, spectra: &[Spectrum]) -> Result<Vec<Spectrum>> {
        spectra.iter().map(|sp| self.filter(sp)).collect()
    }
}

/// Applies filters in sequence.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn SpectrumFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn SpectrumFilter>>) -> Self {
        Self { filters }
    }

    pub fn push(&mut self, filter: Box<dyn SpectrumFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl SpectrumFilter for FilterChain {
    fn name(&self) -> &str {
        "Chain"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let mut current = spectrum.clone();
        for f in &self.filters {
            current = f.filter(&current)?;
        }
        Ok(current)
    }

    fn requires_training(&self) -> bool {
        self.filters.iter().any(|f| f.requires_training())
    }

    /// Each stage is trained on the output of the stages before it.
    fn train(&mut self, spectra: &[Spectrum]) -> Result<()> {
        let mut current = spectra.to_vec();
        for f in &mut self.filters {
            f.train(&current)?;
            current = f.filter_all(&current)?;
        }
        log::debug!(
            "trained chain of {} filters on {} spectra",
            self.filters.len(),
            spectra.len()
        );
        Ok(())
    }
}
