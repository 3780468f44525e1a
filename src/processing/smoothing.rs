use super::{ProcessingError, Result, SpectrumFilter, Statistic};
use crate::data::model::{Spectrum, SpectrumPoint};

/// Centred sliding-window smoothing. The window is truncated at the edges,
/// so the output has as many points as the input.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindow {
    pub half_window: usize,
    pub statistic: Statistic,
}

impl SlidingWindow {
    pub fn new(half_window: usize, statistic: Statistic) -> Result<Self> {
        if half_window == 0 {
            return Err(ProcessingError::InvalidParameter(
                "sliding window needs at least one point either side".into(),
            ));
        }
        Ok(Self {
            half_window,
            statistic,
        })
    }
}

impl SpectrumFilter for SlidingWindow {
    fn name(&self) -> &str {
        "SlidingWindow"
    }

    fn filter(&self, spectrum: &Spectrum) -> Result<Spectrum> {
        let amps = spectrum.amplitudes();
        let mut out = spectrum.clone_header();
        for (i, p) in spectrum.points().iter().enumerate() {
            let lo = i.saturating_sub(self.half_window);
            let hi = (i + self.half_window + 1).min(amps.len());
            out.push(SpectrumPoint::new(
                p.wave_number(),
                self.statistic.apply(&amps[lo..hi]),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_window_truncates_at_edges() {
        let sp = Spectrum::from_arrays("s", &[1.0, 2.0, 3.0, 4.0], &[0.0, 3.0, 6.0, 0.0]).unwrap();
        let out = SlidingWindow::new(1, Statistic::Mean)
            .unwrap()
            .filter(&sp)
            .unwrap();
        assert_eq!(out.wave_numbers(), sp.wave_numbers());
        assert_eq!(out.amplitudes(), vec![1.5, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_median_window_removes_spike() {
        let sp = Spectrum::from_arrays("s", &[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 1.0, 50.0, 1.0, 1.0])
            .unwrap();
        let out = SlidingWindow::new(1, Statistic::Median)
            .unwrap()
            .filter(&sp)
            .unwrap();
        assert_eq!(out.amplitudes(), vec![1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(SlidingWindow::new(0, Statistic::Mean).is_err());
    }
}
