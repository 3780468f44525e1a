use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::model::Spectrum;
use crate::data::report::Report;

// ---------------------------------------------------------------------------
// Reductions over a slice of values
// ---------------------------------------------------------------------------

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the average of the two middle values for even counts.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n − 1). A single value has zero spread.
pub fn std_dev(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(values);
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        }
    }
}

/// Statistic used to combine several values into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Mean,
    Median,
    #[serde(alias = "stddev", alias = "std_dev")]
    Stdev,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [Statistic::Mean, Statistic::Median, Statistic::Stdev];

    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Statistic::Mean => mean(values),
            Statistic::Median => median(values),
            Statistic::Stdev => std_dev(values),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Stdev => "stdev",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Statistic::Mean),
            "median" => Ok(Statistic::Median),
            "stdev" | "stddev" | "std_dev" => Ok(Statistic::Stdev),
            other => Err(format!("unknown statistic '{other}' (mean, median, stdev)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Ordinary least squares
// ---------------------------------------------------------------------------

/// Straight line `y = intercept + slope · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
}

/// Ordinary least-squares fit of `y` on `x`. Pairs beyond the shorter slice
/// are ignored. No points or constant `x` produce a NaN fit.
pub fn linear_regression(x: &[f64], y: &[f64]) -> LinearFit {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let sxx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum();
    let slope = sxy / sxx;
    LinearFit {
        intercept: my - slope * mx,
        slope,
    }
}

// ---------------------------------------------------------------------------
// Spectrum statistics
// ---------------------------------------------------------------------------

/// Summary statistics of a spectrum's amplitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumStatistics {
    pub count: usize,
    pub first_wave_number: f64,
    pub last_wave_number: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
}

impl SpectrumStatistics {
    pub fn compute(spectrum: &Spectrum) -> Self {
        let amps = spectrum.amplitudes();
        let points = spectrum.points();
        Self {
            count: amps.len(),
            first_wave_number: points.first().map_or(f64::NAN, |p| p.wave_number()),
            last_wave_number: points.last().map_or(f64::NAN, |p| p.wave_number()),
            min: spectrum.min_amplitude().unwrap_or(f64::NAN),
            max: spectrum.max_amplitude().unwrap_or(f64::NAN),
            mean: mean(&amps),
            median: median(&amps),
            stdev: std_dev(&amps),
        }
    }

    /// The statistics as numeric report fields.
    pub fn to_report(&self) -> Report {
        let mut report = Report::new();
        report.set_numeric("Number of points", self.count as f64);
        report.set_numeric("First wave number", self.first_wave_number);
        report.set_numeric("Last wave number", self.last_wave_number);
        report.set_numeric("Min amplitude", self.min);
        report.set_numeric("Max amplitude", self.max);
        report.set_numeric("Mean amplitude", self.mean);
        report.set_numeric("Median amplitude", self.median);
        report.set_numeric("Stdev amplitude", self.stdev);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reductions() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(mean(&v), 2.5);
        assert_eq!(median(&v), 2.5);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert!((std_dev(&v) - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(std_dev(&[7.0]), 0.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_statistic_parsing() {
        assert_eq!("MEDIAN".parse::<Statistic>().unwrap(), Statistic::Median);
        assert_eq!("stddev".parse::<Statistic>().unwrap(), Statistic::Stdev);
        assert!("mode".parse::<Statistic>().is_err());
        assert_eq!(Statistic::Stdev.to_string(), "stdev");
    }

    #[test]
    fn test_linear_regression_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 0.5 + 2.0 * v).collect();
        let fit = linear_regression(&x, &y);
        assert!((fit.intercept - 0.5).abs() < 1e-12);
        assert!((fit.slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_regression_degenerate() {
        let fit = linear_regression(&[], &[]);
        assert!(fit.slope.is_nan());
        assert!(fit.intercept.is_nan());
    }

    #[test]
    fn test_spectrum_statistics() {
        let sp = Spectrum::from_arrays("s", &[10.0, 20.0, 30.0], &[1.0, 3.0, 2.0]).unwrap();
        let stats = SpectrumStatistics::compute(&sp);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.first_wave_number, 10.0);
        assert_eq!(stats.last_wave_number, 30.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.to_report().numeric("Mean amplitude"), Some(2.0));
    }
}
