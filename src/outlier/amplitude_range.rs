use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use super::{OutlierDetector, OutlierError, Result};
use crate::data::model::Spectrum;

/// Learns, per wave number, the amplitude envelope of a training set and
/// flags spectra that leave it.
///
/// Detection stops at the first violating point. Wave numbers that never
/// occurred during training are not checked.
#[derive(Debug, Clone, Default)]
pub struct AmplitudeRange {
    bounds: BTreeMap<OrderedFloat<f64>, (f64, f64)>,
}

impl AmplitudeRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learned `(min, max)` for a wave number.
    pub fn bounds(&self, wave_number: f64) -> Option<(f64, f64)> {
        self.bounds.get(&OrderedFloat(wave_number)).copied()
    }
}

impl OutlierDetector for AmplitudeRange {
    fn name(&self) -> &str {
        "AmplitudeRange"
    }

    fn detect(&self, spectrum: &Spectrum) -> Result<Vec<String>> {
        if !self.is_trained() {
            return Err(OutlierError::NotTrained(self.name().to_string()));
        }
        for (i, p) in spectrum.points().iter().enumerate() {
            let Some(&(min, max)) = self.bounds.get(&OrderedFloat(p.wave_number())) else {
                continue;
            };
            let a = p.amplitude();
            if a < min || a > max {
                return Ok(vec![format!(
                    "point #{} (wave number {}): amplitude {a} outside [{min}, {max}]",
                    i + 1,
                    p.wave_number()
                )]);
            }
        }
        Ok(Vec::new())
    }

    fn requires_training(&self) -> bool {
        true
    }

    fn is_trained(&self) -> bool {
        !self.bounds.is_empty()
    }

    fn train(&mut self, spectra: &[Spectrum]) -> Result<()> {
        let mut bounds: BTreeMap<OrderedFloat<f64>, (f64, f64)> = BTreeMap::new();
        for sp in spectra {
            for p in sp.points() {
                let a = p.amplitude();
                bounds
                    .entry(OrderedFloat(p.wave_number()))
                    .and_modify(|(min, max)| {
                        *min = min.min(a);
                        *max = max.max(a);
                    })
                    .or_insert((a, a));
            }
        }
        if bounds.is_empty() {
            return Err(OutlierError::NoTrainingData(self.name().to_string()));
        }
        log::info!(
            "AmplitudeRange trained on {} spectra, {} wave numbers",
            spectra.len(),
            bounds.len()
        );
        self.bounds = bounds;
        Ok(())
    }
}
