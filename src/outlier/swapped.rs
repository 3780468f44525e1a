use super::{OutlierDetector, Result};
use crate::data::model::Spectrum;
use crate::processing::savitzky_golay::SavitzkyGolay;
use crate::processing::{ProcessingError, SpectrumFilter};

/// Detects spectra whose halves appear swapped: after smoothing, the first
/// half is expected to span at least as wide an amplitude range as the second
/// (the reverse when `flip` is set).
#[derive(Debug, Clone, Default)]
pub struct Swapped {
    pub flip: bool,
}

impl Swapped {
    pub fn new(flip: bool) -> Self {
        Self { flip }
    }
}

fn span(values: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

impl OutlierDetector for Swapped {
    fn name(&self) -> &str {
        "Swapped"
    }

    fn detect(&self, spectrum: &Spectrum) -> Result<Vec<String>> {
        // 2nd order smoothing over 3 points either side
        let smoother = SavitzkyGolay::smoothing(2, 3)?;
        let smoothed = match smoother.filter(spectrum) {
            Ok(sp) => sp,
            Err(ProcessingError::TooShort { needed, actual, .. }) => {
                return Ok(vec![format!(
                    "too few points to check ({actual}, need {needed})"
                )]);
            }
            Err(e) => return Err(e.into()),
        };

        let amps = smoothed.amplitudes();
        let (left, right) = amps.split_at(amps.len() / 2);
        let (left, right) = (span(left), span(right));

        let swapped = if self.flip { left > right } else { left < right };
        if swapped {
            let relation = if self.flip { ">" } else { "<" };
            Ok(vec![format!(
                "left half range {left} {relation} right half range {right}"
            )])
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(left_amplitude: f64, right_amplitude: f64) -> Spectrum {
        let waves: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let amps: Vec<f64> = waves
            .iter()
            .map(|w| {
                let amp = if *w < 20.0 { left_amplitude } else { right_amplitude };
                amp * (w / 3.0).sin()
            })
            .collect();
        Spectrum::from_arrays("s", &waves, &amps).unwrap()
    }

    #[test]
    fn test_expected_order_passes() {
        assert!(Swapped::new(false).detect(&spectrum(5.0, 1.0)).unwrap().is_empty());
    }

    #[test]
    fn test_swapped_order_flagged() {
        let violations = Swapped::new(false).detect(&spectrum(1.0, 5.0)).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains('<'));
    }

    #[test]
    fn test_flip_inverts_expectation() {
        assert!(Swapped::new(true).detect(&spectrum(1.0, 5.0)).unwrap().is_empty());
        assert_eq!(Swapped::new(true).detect(&spectrum(5.0, 1.0)).unwrap().len(), 1);
    }

    #[test]
    fn test_short_spectrum_reported() {
        let sp = Spectrum::from_arrays("s", &[1.0, 2.0], &[1.0, 2.0]).unwrap();
        let violations = Swapped::default().detect(&sp).unwrap();
        assert!(violations[0].contains("too few points"));
    }
}
