use super::{OutlierDetector, Result};
use crate::data::model::Spectrum;

/// Flags spectra with fewer than `min` or more than `max` points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointCount {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl PointCount {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl OutlierDetector for PointCount {
    fn name(&self) -> &str {
        "PointCount"
    }

    fn detect(&self, spectrum: &Spectrum) -> Result<Vec<String>> {
        let n = spectrum.len();
        let mut violations = Vec::new();
        if let Some(min) = self.min.filter(|&min| n < min) {
            violations.push(format!("{n} points, fewer than {min}"));
        }
        if let Some(max) = self.max.filter(|&max| n > max) {
            violations.push(format!("{n} points, more than {max}"));
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        let sp = Spectrum::from_arrays("s", &[1.0, 2.0, 3.0], &[0.0; 3]).unwrap();
        assert!(PointCount::new(Some(3), Some(3)).detect(&sp).unwrap().is_empty());
        assert_eq!(PointCount::new(Some(4), None).detect(&sp).unwrap().len(), 1);
        assert_eq!(PointCount::new(None, Some(2)).detect(&sp).unwrap().len(), 1);
        assert!(PointCount::default().detect(&sp).unwrap().is_empty());
    }
}
