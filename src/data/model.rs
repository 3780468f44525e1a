use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};

use super::report::{Report, ReportValue};

/// Format label assigned to spectra that do not declare one.
pub const DEFAULT_FORMAT: &str = "NIR";

// ---------------------------------------------------------------------------
// SpectrumPoint – one (wave number, amplitude) pair
// ---------------------------------------------------------------------------

/// A single spectral point. The wave number is fixed at construction,
/// only the amplitude can be changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumPoint {
    wave_number: f64,
    amplitude: f64,
}

impl SpectrumPoint {
    pub fn new(wave_number: f64, amplitude: f64) -> Self {
        Self {
            wave_number,
            amplitude,
        }
    }

    pub fn wave_number(&self) -> f64 {
        self.wave_number
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = amplitude;
    }
}

// ---------------------------------------------------------------------------
// Spectrum – ordered points plus report
// ---------------------------------------------------------------------------

/// A single spectrum: identifier, format label, points and report.
///
/// Points are conventionally sorted by wave number; readers and filters keep
/// whatever order they are given, [`Spectrum::sort`] establishes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub id: String,
    pub format: String,
    points: Vec<SpectrumPoint>,
    pub report: Report,
}

impl Default for Spectrum {
    fn default() -> Self {
        Self {
            id: String::new(),
            format: DEFAULT_FORMAT.to_string(),
            points: Vec::new(),
            report: Report::new(),
        }
    }
}

impl Spectrum {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Build a spectrum from parallel wave-number and amplitude arrays.
    pub fn from_arrays(id: impl Into<String>, waves: &[f64], amplitudes: &[f64]) -> Result<Self> {
        if waves.len() != amplitudes.len() {
            bail!(
                "{} wave numbers but {} amplitudes",
                waves.len(),
                amplitudes.len()
            );
        }
        let mut sp = Spectrum::new(id);
        sp.points = waves
            .iter()
            .zip(amplitudes)
            .map(|(&w, &a)| SpectrumPoint::new(w, a))
            .collect();
        Ok(sp)
    }

    /// Same id, format and report, but no points.
    pub fn clone_header(&self) -> Self {
        Self {
            id: self.id.clone(),
            format: self.format.clone(),
            points: Vec::new(),
            report: self.report.clone(),
        }
    }

    pub fn push(&mut self, point: SpectrumPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[SpectrumPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [SpectrumPoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn wave_numbers(&self) -> Vec<f64> {
        self.points.iter().map(SpectrumPoint::wave_number).collect()
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.points.iter().map(SpectrumPoint::amplitude).collect()
    }

    pub fn is_sorted(&self) -> bool {
        self.points
            .windows(2)
            .all(|w| w[0].wave_number <= w[1].wave_number)
    }

    /// Sort points by ascending wave number.
    pub fn sort(&mut self) {
        self.points
            .sort_by(|a, b| a.wave_number.total_cmp(&b.wave_number));
    }

    /// Index of the first point whose wave number `==` this one.
    pub fn find(&self, wave_number: f64) -> Option<usize> {
        if self.is_sorted() {
            let i = self.points.partition_point(|p| p.wave_number < wave_number);
            self.points
                .get(i)
                .filter(|p| p.wave_number == wave_number)
                .map(|_| i)
        } else {
            self.points
                .iter()
                .position(|p| p.wave_number == wave_number)
        }
    }

    /// Index of the point whose wave number is nearest to `wave_number`.
    pub fn closest(&self, wave_number: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.wave_number - wave_number)
                    .abs()
                    .total_cmp(&(b.wave_number - wave_number).abs())
            })
            .map(|(i, _)| i)
    }

    /// Indices of all points inside the closed interval `[min, max]`.
    pub fn points_in_range(&self, min: f64, max: f64) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.wave_number >= min && p.wave_number <= max)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn min_amplitude(&self) -> Option<f64> {
        self.points
            .iter()
            .map(SpectrumPoint::amplitude)
            .min_by(f64::total_cmp)
    }

    pub fn max_amplitude(&self) -> Option<f64> {
        self.points
            .iter()
            .map(SpectrumPoint::amplitude)
            .max_by(f64::total_cmp)
    }
}

// ---------------------------------------------------------------------------
// MultiSpectrum – replicate scans of one sample
// ---------------------------------------------------------------------------

/// Replicate scans of one sample sharing a single top-level report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSpectrum {
    pub id: String,
    pub report: Report,
    spectra: Vec<Spectrum>,
}

impl MultiSpectrum {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, spectrum: Spectrum) {
        self.spectra.push(spectrum);
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn into_spectra(self) -> Vec<Spectrum> {
        self.spectra
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spectrum> {
        self.spectra.iter()
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

impl FromIterator<Spectrum> for MultiSpectrum {
    fn from_iter<T: IntoIterator<Item = Spectrum>>(iter: T) -> Self {
        Self {
            spectra: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// SpectralDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All spectra of a file, with pre-computed report field indices.
#[derive(Debug, Clone, Default)]
pub struct SpectralDataset {
    /// All spectra (rows).
    pub spectra: Vec<Spectrum>,
    /// Ordered list of report field names.
    pub column_names: Vec<String>,
    /// For each report field the sorted set of distinct values.
    pub unique_values: BTreeMap<String, BTreeSet<ReportValue>>,
}

impl SpectralDataset {
    /// Build field indices from the loaded spectra.
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<ReportValue>> = BTreeMap::new();

        for sp in &spectra {
            for (name, val) in sp.report.iter() {
                unique_values
                    .entry(name.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names: Vec<String> = unique_values.keys().cloned().collect();
        SpectralDataset {
            spectra,
            column_names,
            unique_values,
        }
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsorted() -> Spectrum {
        Spectrum::from_arrays("s", &[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0]).unwrap()
    }

    #[test]
    fn test_from_arrays_rejects_length_mismatch() {
        assert!(Spectrum::from_arrays("s", &[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_sort_and_find() {
        let mut sp = unsorted();
        assert!(!sp.is_sorted());
        assert_eq!(sp.find(2.0), Some(2));

        sp.sort();
        assert!(sp.is_sorted());
        assert_eq!(sp.wave_numbers(), vec![1.0, 2.0, 3.0]);
        assert_eq!(sp.amplitudes(), vec![10.0, 20.0, 30.0]);
        assert_eq!(sp.find(3.0), Some(2));
        assert_eq!(sp.find(2.5), None);
        assert_eq!(sp.closest(2.4), Some(1));
    }

    #[test]
    fn test_find_signed_zero_sorted_and_unsorted() {
        let sorted = Spectrum::from_arrays("s", &[-1.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).unwrap();
        let shuffled = Spectrum::from_arrays("u", &[1.0, 0.0, -1.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!(sorted.is_sorted() && !shuffled.is_sorted());

        assert_eq!(sorted.find(-0.0), Some(1));
        assert_eq!(shuffled.find(-0.0), Some(1));
        assert_eq!(sorted.find(f64::NAN), None);
        assert_eq!(shuffled.find(f64::NAN), None);
    }

    #[test]
    fn test_range_and_extremes() {
        let mut sp = unsorted();
        sp.sort();
        assert_eq!(sp.points_in_range(1.5, 3.0), vec![1, 2]);
        assert_eq!(sp.min_amplitude(), Some(10.0));
        assert_eq!(sp.max_amplitude(), Some(30.0));
        assert_eq!(Spectrum::new("empty").min_amplitude(), None);
    }

    #[test]
    fn test_clone_header_drops_points() {
        let mut sp = unsorted();
        sp.report.set_string("Sample ID", "abc");
        let header = sp.clone_header();
        assert!(header.is_empty());
        assert_eq!(header.report.string("Sample ID"), Some("abc"));
        assert_eq!(header.format, DEFAULT_FORMAT);
    }

    #[test]
    fn test_dataset_indexes_report_fields() {
        let mut a = Spectrum::new("a");
        a.report.set_string("sample", "A");
        a.report.set_numeric("conc", 1.0);
        let mut b = Spectrum::new("b");
        b.report.set_string("sample", "B");

        let ds = SpectralDataset::from_spectra(vec![a, b]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names, vec!["conc".to_string(), "sample".to_string()]);
        assert_eq!(ds.unique_values["sample"].len(), 2);
        assert_eq!(ds.unique_values["conc"].len(), 1);
    }
}
