use std::borrow::Cow;

use nalgebra::DMatrix;

use super::{ProcessingError, Result, SpectrumFilter};
use crate::data::model::{Spectrum, SpectrumPoint};

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

/// Savitzky-Golay convolution coefficients for a window of `left + right + 1`
/// points, fitted with a polynomial of the given order. The returned weights
/// produce the `derivative`-th derivative (0 = smoothing) at the window centre,
/// in units of the sample index.
pub fn coefficients(
    left: usize,
    right: usize,
    polynomial: usize,
    derivative: usize,
) -> Result<Vec<f64>> {
    let window = left + right + 1;
    if polynomial >= window {
        return Err(ProcessingError::InvalidParameter(format!(
            "polynomial order {polynomial} needs a window larger than {window} points"
        )));
    }
    if derivative > polynomial {
        return Err(ProcessingError::InvalidParameter(format!(
            "derivative order {derivative} exceeds polynomial order {polynomial}"
        )));
    }

    // Vandermonde matrix over the offsets -left..=right
    let a = DMatrix::from_fn(window, polynomial + 1, |i, j| {
        (i as f64 - left as f64).powi(j as i32)
    });
    let ata = a.transpose() * &a;
    let inv = ata.try_inverse().ok_or_else(|| {
        ProcessingError::Degenerate("singular Savitzky-Golay normal equations".into())
    })?;
    let projection = inv * a.transpose();

    let factorial: f64 = (1..=derivative).map(|k| k as f64).product();
    Ok(projection
        .row(derivative)
        .iter()
        .map(|c| c * factorial)
        .collect())
}

// ---------------------------------------------------------------------------
// SavitzkyGolay filter
// ---------------------------------------------------------------------------

/// Savitzky-Golay smoothing / derivative filter.
///
/// The output drops `left` leading and `right` trailing points, since no full
/// window exists for them; the remaining points keep their wave numbers.
/// The parameters are fixed at construction, together with the weights.
#[derive(Debug, Clone, PartialEq)]
pub struct SavitzkyGolay {
    polynomial: usize,
    derivative: usize,
    left: usize,
    right: usize,
    weights: Vec<f64>,
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        // 2nd order polynomial, 1st derivative, 3 points either side
        Self {
            polynomial: 2,
            derivative: 1,
            left: 3,
            right: 3,
            weights: Vec::new(),
        }
    }
}

impl SavitzkyGolay {
    pub fn new(polynomial: usize, derivative: usize, left: usize, right: usize) -> Result<Self> {
        let weights = coefficients(left, right, polynomial, derivative)?;
        Ok(Self {
            polynomial,
            derivative,
            left,
            right,
            weights,
        })
    }

    /// Plain smoothing with a symmetric window.
    pub fn smoothing(polynomial: usize, half_window: usize) -> Result<Self> {
        Self::new(polynomial, 0, half_window, half_window)
    }

    pub fn polynomial(&self) -> usize {
        self.polynomial
    }

    pub fn derivative(&self) -> usize {
        self.derivative
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn window(&self) -> usize {
        self.left + self.right + 1
    }

    /// Weights from `new`; `Default` computes them on use.
    fn weights(&self) -> Result<Cow<'_, [f64]>> {
        if self.weights.is_empty() {
            coefficients(self.left, self.right, self.polynomial, self.derivative)
                .map(Cow::Owned)
        } else {
            Ok(Cow::Borrowed(&self.weights))
        }
    }

    /// Convolve raw amplitudes; returns `len - left - right` values.
    pub fn convolve(&self, amplitudes: &[f64]) -> Result<Vec<f64>> {
        let weights = self.weights()?;
        if amplitudes.len() < weights.len() {
            return Err(ProcessingError::TooShort {
                id: String::new(),
                needed: weights.len(),
                actual: amplitudes.len(),
            });
        }
        Ok(amplitudes
            .windows(weights.len())
            .map(|w| w.iter().zip(weights.iter()).map(|(a, c)| a * c).sum::<f64>())
            .collect())
    }
}

impl SpectrumFilter for SavitzkyGolay {
    fn name(&self) -> &str {
        "SavitzkyGolay"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let amps = spectrum.amplitudes();
        let smoothed = self.convolve(&amps).map_err(|e| match e {
            ProcessingError::TooShort { needed, actual, .. } => ProcessingError::TooShort {
                id: spectrum.id.clone(),
                needed,
                actual,
            },
            other => other,
        })?;

        let mut out = spectrum.clone_header();
        for (p, a) in spectrum.points()[self.left..].iter().zip(smoothed) {
            out.push(SpectrumPoint::new(p.wave_number(), a));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// SegmentedSavitzkyGolay
// ---------------------------------------------------------------------------

/// Savitzky-Golay applied independently to wave-number segments.
///
/// `boundaries` split the spectrum: a point with wave number `w` belongs to
/// the segment after the last boundary `<= w`. Each segment is smoothed on its
/// own (dropping its own edge points); segments shorter than the window are
/// passed through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedSavitzkyGolay {
    pub boundaries: Vec<f64>,
    inner: SavitzkyGolay,
}

impl SegmentedSavitzkyGolay {
    pub fn new(mut boundaries: Vec<f64>, inner: SavitzkyGolay) -> Self {
        boundaries.sort_by(f64::total_cmp);
        Self { boundaries, inner }
    }

    fn segment_of(&self, wave_number: f64) -> usize {
        self.boundaries.partition_point(|b| *b <= wave_number)
    }
}

impl SpectrumFilter for SegmentedSavitzkyGolay {
    fn name(&self) -> &str {
        "SegmentedSavitzkyGolay"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let mut out = spectrum.clone_header();
        let points = spectrum.points();
        let mut start = 0;

        while start < points.len() {
            let seg = self.segment_of(points[start].wave_number());
            let len = points[start..]
                .iter()
                .take_while(|p| self.segment_of(p.wave_number()) == seg)
                .count();
            let segment = &points[start..start + len];

            if segment.len() < self.inner.window() {
                log::debug!(
                    "segment {seg} of '{}' has {} points, passing through",
                    spectrum.id,
                    segment.len()
                );
                for p in segment {
                    out.push(*p);
                }
            } else {
                let amps: Vec<f64> = segment.iter().map(SpectrumPoint::amplitude).collect();
                let smoothed = self.inner.convolve(&amps)?;
                for (p, a) in segment[self.inner.left..].iter().zip(smoothed) {
                    out.push(SpectrumPoint::new(p.wave_number(), a));
                }
            }
            start += len;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_classic_smoothing_coefficients() {
        let c = coefficients(2, 2, 2, 0).unwrap();
        let expected: Vec<f64> = [-3.0, 12.0, 17.0, 12.0, -3.0]
            .iter()
            .map(|v| v / 35.0)
            .collect();
        assert_close(&c, &expected);
    }

    #[test]
    fn test_first_derivative_coefficients() {
        let c = coefficients(2, 2, 2, 1).unwrap();
        let expected: Vec<f64> = [-2.0, -1.0, 0.0, 1.0, 2.0].iter().map(|v| v / 10.0).collect();
        assert_close(&c, &expected);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(coefficients(1, 1, 3, 0).is_err());
        assert!(coefficients(3, 3, 2, 3).is_err());
    }

    #[test]
    fn test_filter_drops_edges_and_preserves_quadratic() {
        let waves: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let amps: Vec<f64> = waves.iter().map(|w| 1.0 + 2.0 * w + 0.5 * w * w).collect();
        let sp = Spectrum::from_arrays("q", &waves, &amps).unwrap();

        let sg = SavitzkyGolay::smoothing(2, 3).unwrap();
        let out = sg.filter(&sp).unwrap();
        assert_eq!(out.wave_numbers(), waves[3..7].to_vec());
        assert_close(&out.amplitudes(), &amps[3..7]);
    }

    #[test]
    fn test_other_window_is_built_with_new_weights() {
        let waves: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let sp = Spectrum::from_arrays("ramp", &waves, &waves).unwrap();

        let wide = SavitzkyGolay::smoothing(2, 3).unwrap();
        let narrow = SavitzkyGolay::new(wide.polynomial(), wide.derivative(), 1, 1).unwrap();
        assert_eq!((narrow.left(), narrow.right(), narrow.window()), (1, 1, 3));

        // a ramp is preserved, every point keeps its own amplitude
        let out = narrow.filter(&sp).unwrap();
        assert_eq!(out.wave_numbers(), waves[1..9].to_vec());
        assert_close(&out.amplitudes(), &waves[1..9]);
    }

    #[test]
    fn test_default_weights_match_new() {
        let waves: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let amps: Vec<f64> = waves.iter().map(|w| w * w).collect();
        let sp = Spectrum::from_arrays("sq", &waves, &amps).unwrap();

        let lazy = SavitzkyGolay::default().filter(&sp).unwrap();
        let built = SavitzkyGolay::new(2, 1, 3, 3).unwrap().filter(&sp).unwrap();
        assert_eq!(lazy, built);
    }

    #[test]
    fn test_short_spectrum_names_spectrum() {
        let sp = Spectrum::from_arrays("tiny", &[1.0, 2.0], &[1.0, 2.0]).unwrap();
        let err = SavitzkyGolay::default().filter(&sp).unwrap_err();
        assert!(matches!(err, ProcessingError::TooShort { ref id, needed: 7, actual: 2 } if id == "tiny"));
    }

    #[test]
    fn test_segmented_smooths_segments_independently() {
        let waves: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let amps: Vec<f64> = waves.iter().map(|w| if *w < 6.0 { *w } else { 100.0 - w }).collect();
        let sp = Spectrum::from_arrays("seg", &waves, &amps).unwrap();

        let inner = SavitzkyGolay::smoothing(1, 1).unwrap();
        let out = SegmentedSavitzkyGolay::new(vec![6.0], inner).filter(&sp).unwrap();

        // each 6-point segment loses one point per edge; linear data is preserved
        assert_eq!(out.wave_numbers(), vec![1.0, 2.0, 3.0, 4.0, 7.0, 8.0, 9.0, 10.0]);
        assert_close(&out.amplitudes(), &[1.0, 2.0, 3.0, 4.0, 93.0, 92.0, 91.0, 90.0]);
    }

    #[test]
    fn test_segmented_passes_short_segments_through() {
        let sp = Spectrum::from_arrays("seg", &[0.0, 1.0, 5.0], &[1.0, 2.0, 3.0]).unwrap();
        let inner = SavitzkyGolay::smoothing(1, 1).unwrap();
        let out = SegmentedSavitzkyGolay::new(vec![4.0], inner).filter(&sp).unwrap();
        assert_eq!(out, sp);
    }
}
