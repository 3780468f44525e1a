//! Outlier detectors for spectra and 3-way data.
//!
//! A detector returns the list of violations it found; an empty list means
//! the input is not an outlier.

pub mod amplitude_range;
pub mod point_count;
pub mod swapped;
pub mod value_range;

pub use amplitude_range::AmplitudeRange;
pub use point_count::PointCount;
pub use swapped::Swapped;
pub use value_range::ValueRange;

use crate::data::model::Spectrum;
use crate::processing::ProcessingError;

#[derive(Debug, thiserror::Error)]
pub enum OutlierError {
    /// Detection was attempted before training
    #[error("{0} has not been trained")]
    NotTrained(String),

    /// Training was given nothing to learn from
    #[error("{0}: no training data")]
    NoTrainingData(String),

    /// Preprocessing inside the detector failed
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),
}

pub type Result<T> = std::result::Result<T, OutlierError>;

/// Checks a single spectrum.
pub trait OutlierDetector: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Human-readable violations; empty when the spectrum passes.
    fn detect(&self, spectrum: &Spectrum) -> Result<Vec<String>>;

    /// Whether [`OutlierDetector::train`] must run before detection.
    fn requires_training(&self) -> bool {
        false
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn train(&mut self, _spectra: &[Spectrum]) -> Result<()> {
        Ok(())
    }
}

/// Run every detector on a spectrum and collect the violations, each prefixed
/// with the name of the detector that raised it.
pub fn detect_all(detectors: &[Box<dyn OutlierDetector>], spectrum: &Spectrum) -> Result<Vec<String>> {
    let mut violations = Vec::new();
    for d in detectors {
        violations.extend(
            d.detect(spectrum)?
                .into_iter()
                .map(|v| format!("{}: {v}", d.name())),
        );
    }
    Ok(violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_all_prefixes_names() {
        let detectors: Vec<Box<dyn OutlierDetector>> = vec![
            Box::new(PointCount::new(Some(3), None)),
            Box::new(PointCount::new(None, Some(10))),
        ];
        let sp = Spectrum::from_arrays("s", &[1.0, 2.0], &[1.0, 1.0]).unwrap();
        let violations = detect_all(&detectors, &sp).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("PointCount: "));
    }
}
