use super::{ProcessingError, Result, SpectrumFilter};
use crate::data::model::Spectrum;

/// Keeps every `nth` point, starting with the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Downsample {
    nth: usize,
}

impl Downsample {
    pub fn new(nth: usize) -> Result<Self> {
        if nth == 0 {
            return Err(ProcessingError::InvalidParameter(
                "downsample step must be at least 1".into(),
            ));
        }
        Ok(Self { nth })
    }

    pub fn nth(&self) -> usize {
        self.nth
    }
}

impl SpectrumFilter for Downsample {
    fn name(&self) -> &str {
        "Downsample"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let mut out = spectrum.clone_header();
        for p in spectrum.points().iter().step_by(self.nth) {
            out.push(*p);
        }
        Ok(out)
    }
}

/// Keeps only points whose wave number lies in `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Crop {
    pub min: f64,
    pub max: f64,
}

impl Crop {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl SpectrumFilter for Crop {
    fn name(&self) -> &str {
        "Crop"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        if self.min > self.max {
            return Err(ProcessingError::InvalidParameter(format!(
                "crop range [{}, {}] is empty",
                self.min, self.max
            )));
        }
        let mut out = spectrum.clone_header();
        for i in spectrum.points_in_range(self.min, self.max) {
            out.push(spectrum.points()[i]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Spectrum {
        let waves: Vec<f64> = (0..7).map(|i| i as f64).collect();
        Spectrum::from_arrays("ramp", &waves, &waves).unwrap()
    }

    #[test]
    fn test_downsample() {
        let out = Downsample::new(3).unwrap().filter(&ramp()).unwrap();
        assert_eq!(out.wave_numbers(), vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_downsample_rejects_zero_step() {
        assert!(matches!(
            Downsample::new(0),
            Err(ProcessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_crop_is_inclusive() {
        let out = Crop::new(2.0, 4.0).filter(&ramp()).unwrap();
        assert_eq!(out.wave_numbers(), vec![2.0, 3.0, 4.0]);
        assert!(Crop::new(4.0, 2.0).filter(&ramp()).is_err());
    }
}
