use nalgebra::{DMatrix, DVector};

use super::{stats, ProcessingError, Result, SpectrumFilter};
use crate::data::model::{Spectrum, SpectrumPoint};

/// How the baseline to subtract is estimated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineMethod {
    /// Subtract the minimum amplitude.
    Offset,
    /// Subtract the straight line through the first and last points.
    Linear,
    /// Subtract a least-squares polynomial in the wave number.
    Polynomial { degree: usize },
}

/// Baseline correction.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineCorrection {
    pub method: BaselineMethod,
}

impl BaselineCorrection {
    pub fn new(method: BaselineMethod) -> Self {
        Self { method }
    }

    fn baseline(&self, spectrum: &Spectrum) -> Result<Vec<f64>> {
        let points = spectrum.points();
        let (first, last) = match (points.first(), points.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Ok(Vec::new()),
        };

        match self.method {
            BaselineMethod::Offset => {
                let min = spectrum.min_amplitude().unwrap_or(0.0);
                Ok(vec![min; points.len()])
            }
            BaselineMethod::Linear => {
                let span = last.wave_number() - first.wave_number();
                if span == 0.0 {
                    return Ok(vec![first.amplitude(); points.len()]);
                }
                let slope = (last.amplitude() - first.amplitude()) / span;
                Ok(points
                    .iter()
                    .map(|p| first.amplitude() + slope * (p.wave_number() - first.wave_number()))
                    .collect())
            }
            BaselineMethod::Polynomial { degree } => polynomial_baseline(spectrum, degree),
        }
    }
}

/// Least-squares polynomial over centred and scaled wave numbers.
fn polynomial_baseline(spectrum: &Spectrum, degree: usize) -> Result<Vec<f64>> {
    let n = spectrum.len();
    if n <= degree {
        return Err(ProcessingError::TooShort {
            id: spectrum.id.clone(),
            needed: degree + 1,
            actual: n,
        });
    }
    let waves = spectrum.wave_numbers();
    let centre = stats::mean(&waves);
    let scale = waves
        .iter()
        .map(|w| (w - centre).abs())
        .fold(0.0, f64::max)
        .max(f64::EPSILON);
    let t: Vec<f64> = waves.iter().map(|w| (w - centre) / scale).collect();

    let a = DMatrix::from_fn(n, degree + 1, |i, j| t[i].powi(j as i32));
    let b = DVector::from_vec(spectrum.amplitudes());
    let coeffs = a
        .clone()
        .svd(true, true)
        .solve(&b, 1e-12)
        .map_err(|e| ProcessingError::Degenerate(format!("polynomial baseline: {e}")))?;

    Ok((a * coeffs).iter().copied().collect())
}

impl SpectrumFilter for BaselineCorrection {
    fn name(&self) -> &str {
        "BaselineCorrection"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let baseline = self.baseline(spectrum)?;
        let mut out = spectrum.clone_header();
        for (p, b) in spectrum.points().iter().zip(baseline) {
            out.push(SpectrumPoint::new(p.wave_number(), p.amplitude() - b));
        }
        Ok(out)
    }
}
