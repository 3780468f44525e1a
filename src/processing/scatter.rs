//! Scatter correction: standard normal variate and multiplicative scatter
//! correction (MSC) with pluggable correctors.

use super::merge::average_spectrum;
use super::stats::{self, linear_regression};
use super::{ProcessingError, Result, SpectrumFilter};
use crate::data::model::{Spectrum, SpectrumPoint};

// ---------------------------------------------------------------------------
// Standard normal variate
// ---------------------------------------------------------------------------

/// Centres each spectrum on its mean amplitude and scales by its standard
/// deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardNormalVariate;

impl SpectrumFilter for StandardNormalVariate {
    fn name(&self) -> &str {
        "SNV"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let amps = spectrum.amplitudes();
        let mean = stats::mean(&amps);
        let sd = stats::std_dev(&amps);
        if !(sd > 0.0) {
            return Err(ProcessingError::Degenerate(format!(
                "spectrum '{}' has no amplitude variation",
                spectrum.id
            )));
        }
        let mut out = spectrum.clone_header();
        for p in spectrum.points() {
            out.push(SpectrumPoint::new(p.wave_number(), (p.amplitude() - mean) / sd));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Correctors
// ---------------------------------------------------------------------------

/// Corrects a spectrum against a reference ("average") spectrum.
pub trait ScatterCorrector: std::fmt::Debug {
    fn correct(&self, average: &Spectrum, data: &Spectrum) -> Result<Spectrum>;
}

/// Report field names under which a range's fit is stored.
pub fn range_fields(min: f64, max: f64) -> (String, String) {
    (
        format!("MSC[{min}-{max}].intercept"),
        format!("MSC[{min}-{max}].slope"),
    )
}

/// Per-range MSC: for each wave-number interval, regress the (optionally
/// pre-filtered) data amplitudes on the reference amplitudes, then map every
/// point of the interval through `(amplitude - intercept) / slope`.
///
/// Reference and data are paired by index. Intervals are closed and are
/// applied in order, so later intervals win where they overlap. An interval
/// that selects no points yields a NaN fit.
#[derive(Debug)]
pub struct RangeBased {
    pub ranges: Vec<(f64, f64)>,
    pub pre_filter: Option<Box<dyn SpectrumFilter>>,
}

impl RangeBased {
    pub fn new(ranges: Vec<(f64, f64)>) -> Self {
        Self {
            ranges,
            pre_filter: None,
        }
    }

    /// Classic MSC: a single interval covering every wave number.
    pub fn full() -> Self {
        Self::new(vec![(f64::NEG_INFINITY, f64::INFINITY)])
    }

    pub fn with_pre_filter(mut self, filter: Box<dyn SpectrumFilter>) -> Self {
        self.pre_filter = Some(filter);
        self
    }
}

impl ScatterCorrector for RangeBased {
    fn correct(&self, average: &Spectrum, data: &Spectrum) -> Result<Spectrum> {
        if average.len() != data.len() {
            return Err(ProcessingError::LengthMismatch {
                expected: average.len(),
                actual: data.len(),
            });
        }
        let filtered = match &self.pre_filter {
            Some(f) => {
                let filtered = f.filter(data)?;
                if filtered.len() != data.len() {
                    return Err(ProcessingError::LengthMismatch {
                        expected: data.len(),
                        actual: filtered.len(),
                    });
                }
                filtered
            }
            None => data.clone(),
        };

        let mut out = data.clone();
        for &(min, max) in &self.ranges {
            let indices = data.points_in_range(min, max);
            let x: Vec<f64> = indices
                .iter()
                .map(|&i| average.points()[i].amplitude())
                .collect();
            let y: Vec<f64> = indices
                .iter()
                .map(|&i| filtered.points()[i].amplitude())
                .collect();
            let fit = linear_regression(&x, &y);
            if indices.is_empty() {
                log::warn!(
                    "MSC range [{min}, {max}] selects no points of '{}'",
                    data.id
                );
            }

            let (intercept_field, slope_field) = range_fields(min, max);
            out.report.set_numeric(intercept_field, fit.intercept);
            out.report.set_numeric(slope_field, fit.slope);

            let originals = data.points();
            let points = out.points_mut();
            for &i in &indices {
                points[i].set_amplitude((originals[i].amplitude() - fit.intercept) / fit.slope);
            }
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// MSC filter
// ---------------------------------------------------------------------------

/// Multiplicative scatter correction. Training averages the training set into
/// the reference spectrum; filtering applies the corrector against it.
#[derive(Debug)]
pub struct MultiplicativeScatterCorrection {
    corrector: Box<dyn ScatterCorrector>,
    average: Option<Spectrum>,
}

impl MultiplicativeScatterCorrection {
    pub fn new(corrector: impl ScatterCorrector + 'static) -> Self {
        Self {
            corrector: Box::new(corrector),
            average: None,
        }
    }

    /// Use a known reference instead of training.
    pub fn with_average(mut self, average: Spectrum) -> Self {
        self.average = Some(average);
        self
    }

    pub fn average(&self) -> Option<&Spectrum> {
        self.average.as_ref()
    }
}

impl SpectrumFilter for MultiplicativeScatterCorrection {
    fn name(&self) -> &str {
        "MSC"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let average = self
            .average
            .as_ref()
            .ok_or_else(|| ProcessingError::NotTrained(self.name().to_string()))?;
        self.corrector.correct(average, spectrum)
    }

    fn requires_training(&self) -> bool {
        true
    }

    fn train(&mut self, spectra: &[Spectrum]) -> Result<()> {
        let average = average_spectrum(spectra)?;
        log::info!(
            "MSC reference built from {} spectra ({} points)",
            spectra.len(),
            average.len()
        );
        self.average = Some(average);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::smoothing::SlidingWindow;
    use crate::processing::Statistic;

    fn spectrum(id: &str, amps: &[f64]) -> Spectrum {
        let waves: Vec<f64> = (0..amps.len()).map(|i| 100.0 + i as f64).collect();
        Spectrum::from_arrays(id, &waves, amps).unwrap()
    }

    #[test]
    fn test_snv() {
        let out = StandardNormalVariate
            .filter(&spectrum("s", &[1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(out.amplitudes(), vec![-1.0, 0.0, 1.0]);
        assert!(StandardNormalVariate
            .filter(&spectrum("flat", &[2.0, 2.0]))
            .is_err());
    }

    #[test]
    fn test_range_based_applies_formula_per_range() {
        let average = spectrum("avg", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        // first half scaled/offset one way, second half another
        let data = spectrum("d", &[2.5, 4.5, 6.5, 3.0, 3.5, 4.1]);
        let corrector = RangeBased::new(vec![(100.0, 102.0), (103.0, 105.0)]);

        let out = corrector.correct(&average, &data).unwrap();

        for (min, max) in [(100.0, 102.0), (103.0, 105.0)] {
            let idx = data.points_in_range(min, max);
            let x: Vec<f64> = idx.iter().map(|&i| average.points()[i].amplitude()).collect();
            let y: Vec<f64> = idx.iter().map(|&i| data.points()[i].amplitude()).collect();
            let fit = linear_regression(&x, &y);

            let (fi, fs) = range_fields(min, max);
            assert_eq!(out.report.numeric(&fi), Some(fit.intercept));
            assert_eq!(out.report.numeric(&fs), Some(fit.slope));
            for &i in &idx {
                let expected = (data.points()[i].amplitude() - fit.intercept) / fit.slope;
                assert!((out.points()[i].amplitude() - expected).abs() < 1e-12);
            }
        }
        // exact linear relationship in the first range maps back onto the average
        assert!((out.points()[0].amplitude() - 1.0).abs() < 1e-12);
        assert!((out.points()[2].amplitude() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_range_based_overlap_later_wins() {
        let average = spectrum("avg", &[1.0, 2.0, 3.0, 4.0]);
        let data = spectrum("d", &[3.0, 5.0, 7.0, 20.0]);
        let out = RangeBased::new(vec![(100.0, 102.0), (101.0, 103.0)])
            .correct(&average, &data)
            .unwrap();

        let second = linear_regression(&[2.0, 3.0, 4.0], &[5.0, 7.0, 20.0]);
        let expected = (5.0 - second.intercept) / second.slope;
        assert!((out.points()[1].amplitude() - expected).abs() < 1e-12);
        // index 0 only in the first range: exact fit 1 + 2x
        assert!((out.points()[0].amplitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_range_based_empty_range_is_nan() {
        let average = spectrum("avg", &[1.0, 2.0]);
        let data = spectrum("d", &[2.0, 4.0]);
        let out = RangeBased::new(vec![(0.0, 1.0)])
            .correct(&average, &data)
            .unwrap();
        let (_, slope) = range_fields(0.0, 1.0);
        assert!(out.report.numeric(&slope).unwrap().is_nan());
        assert_eq!(out.amplitudes(), data.amplitudes());
    }

    #[test]
    fn test_range_based_uses_pre_filtered_data_for_fit_only() {
        let average = spectrum("avg", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let data = spectrum("d", &[2.0, 4.0, 9.0, 8.0, 10.0]);
        let smoother = SlidingWindow::new(1, Statistic::Median).unwrap();
        let corrector = RangeBased::full().with_pre_filter(Box::new(smoother.clone()));

        let out = corrector.correct(&average, &data).unwrap();

        let filtered = smoother.filter(&data).unwrap();
        let fit = linear_regression(&average.amplitudes(), &filtered.amplitudes());
        let expected = (9.0 - fit.intercept) / fit.slope;
        assert!((out.points()[2].amplitude() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_range_based_length_mismatch() {
        let err = RangeBased::full()
            .correct(&spectrum("a", &[1.0, 2.0]), &spectrum("b", &[1.0]))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::LengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_msc_training() {
        let mut msc = MultiplicativeScatterCorrection::new(RangeBased::full());
        assert!(matches!(
            msc.filter(&spectrum("x", &[1.0, 2.0])),
            Err(ProcessingError::NotTrained(_))
        ));

        msc.train(&[spectrum("a", &[1.0, 2.0, 4.0]), spectrum("b", &[3.0, 6.0, 12.0])])
            .unwrap();
        assert_eq!(msc.average().unwrap().amplitudes(), vec![2.0, 4.0, 8.0]);

        let out = msc.filter(&spectrum("c", &[1.5, 2.5, 4.5])).unwrap();
        for (a, e) in out.amplitudes().iter().zip([2.0, 4.0, 8.0]) {
            assert!((a - e).abs() < 1e-12);
        }
    }
}
