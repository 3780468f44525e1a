//! TOML pipeline configuration.
//!
//! A pipeline file lists the filters to apply, in order, and the outlier
//! detectors to run:
//!
//! ```toml
//! [[filters]]
//! type = "savitzky-golay"
//! polynomial = 2
//! derivative = 0
//! left = 3
//! right = 3
//!
//! [[filters]]
//! type = "msc"
//! ranges = [[1100.0, 1500.0], [1600.0, 2400.0]]
//!
//! [filters.pre_filter]
//! type = "sliding-window"
//! half_window = 2
//! statistic = "median"
//!
//! [[detectors]]
//! type = "amplitude-range"
//!
//! [collapse]
//! statistic = "median"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::outlier::{AmplitudeRange, OutlierDetector, PointCount, Swapped, ValueRange};
use crate::processing::baseline::{BaselineCorrection, BaselineMethod};
use crate::processing::collapse::CollapseX;
use crate::processing::resample::{Crop, Downsample};
use crate::processing::savitzky_golay::{SavitzkyGolay, SegmentedSavitzkyGolay};
use crate::processing::scatter::{MultiplicativeScatterCorrection, RangeBased, StandardNormalVariate};
use crate::processing::smoothing::SlidingWindow;
use crate::processing::{self, FilterChain, SpectrumFilter, Statistic};

/// Root configuration structure for pipeline files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Filters applied in order.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    /// Outlier detectors for spectra.
    #[serde(default)]
    pub detectors: Vec<DetectorConfig>,

    /// Settings for merging 3-way data.
    #[serde(default)]
    pub collapse: CollapseConfig,

    /// Bounds for checking 3-way data.
    #[serde(default)]
    pub value_range: ValueRangeConfig,
}

fn default_polynomial() -> usize {
    2
}

fn default_half_window() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FilterConfig {
    SavitzkyGolay {
        #[serde(default = "default_polynomial")]
        polynomial: usize,
        #[serde(default)]
        derivative: usize,
        #[serde(default = "default_half_window")]
        left: usize,
        #[serde(default = "default_half_window")]
        right: usize,
    },
    SegmentedSavitzkyGolay {
        boundaries: Vec<f64>,
        #[serde(default = "default_polynomial")]
        polynomial: usize,
        #[serde(default)]
        derivative: usize,
        #[serde(default = "default_half_window")]
        left: usize,
        #[serde(default = "default_half_window")]
        right: usize,
    },
    SlidingWindow {
        #[serde(default = "default_half_window")]
        half_window: usize,
        #[serde(default)]
        statistic: Statistic,
    },
    Snv,
    Baseline {
        method: BaselineKind,
        /// Polynomial degree, only used by `method = "polynomial"`.
        #[serde(default = "default_polynomial")]
        degree: usize,
    },
    Downsample {
        nth: usize,
    },
    Crop {
        min: f64,
        max: f64,
    },
    Msc {
        /// Wave-number intervals; the whole spectrum when omitted.
        #[serde(default)]
        ranges: Option<Vec<(f64, f64)>>,
        #[serde(default)]
        pre_filter: Option<Box<FilterConfig>>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineKind {
    Offset,
    Linear,
    Polynomial,
}

impl FilterConfig {
    pub fn build(&self) -> processing::Result<Box<dyn SpectrumFilter>> {
        let filter: Box<dyn SpectrumFilter> = match self {
            FilterConfig::SavitzkyGolay {
                polynomial,
                derivative,
                left,
                right,
            } => Box::new(SavitzkyGolay::new(*polynomial, *derivative, *left, *right)?),
            FilterConfig::SegmentedSavitzkyGolay {
                boundaries,
                polynomial,
                derivative,
                left,
                right,
            } => Box::new(SegmentedSavitzkyGolay::new(
                boundaries.clone(),
                SavitzkyGolay::new(*polynomial, *derivative, *left, *right)?,
            )),
            FilterConfig::SlidingWindow {
                half_window,
                statistic,
            } => Box::new(SlidingWindow::new(*half_window, *statistic)?),
            FilterConfig::Snv => Box::new(StandardNormalVariate),
            FilterConfig::Baseline { method, degree } => {
                let method = match method {
                    BaselineKind::Offset => BaselineMethod::Offset,
                    BaselineKind::Linear => BaselineMethod::Linear,
                    BaselineKind::Polynomial => BaselineMethod::Polynomial { degree: *degree },
                };
                Box::new(BaselineCorrection::new(method))
            }
            FilterConfig::Downsample { nth } => Box::new(Downsample::new(*nth)?),
            FilterConfig::Crop { min, max } => Box::new(Crop::new(*min, *max)),
            FilterConfig::Msc { ranges, pre_filter } => {
                let mut corrector = match ranges {
                    Some(r) => RangeBased::new(r.clone()),
                    None => RangeBased::full(),
                };
                if let Some(pre) = pre_filter {
                    corrector = corrector.with_pre_filter(pre.build()?);
                }
                Box::new(MultiplicativeScatterCorrection::new(corrector))
            }
        };
        Ok(filter)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DetectorConfig {
    AmplitudeRange,
    Swapped {
        #[serde(default)]
        flip: bool,
    },
    PointCount {
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl DetectorConfig {
    pub fn build(&self) -> Box<dyn OutlierDetector> {
        match self {
            DetectorConfig::AmplitudeRange => Box::new(AmplitudeRange::new()),
            DetectorConfig::Swapped { flip } => Box::new(Swapped::new(*flip)),
            DetectorConfig::PointCount { min, max } => Box::new(PointCount::new(*min, *max)),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CollapseConfig {
    #[serde(default)]
    pub statistic: Statistic,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ValueRangeConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Build the configured filters as one chain (untrained).
    pub fn build_filters(&self) -> processing::Result<FilterChain> {
        let filters = self
            .filters
            .iter()
            .map(FilterConfig::build)
            .collect::<processing::Result<Vec<_>>>()?;
        Ok(FilterChain::new(filters))
    }

    /// Build the configured spectrum detectors (untrained).
    pub fn build_detectors(&self) -> Vec<Box<dyn OutlierDetector>> {
        self.detectors.iter().map(DetectorConfig::build).collect()
    }

    pub fn collapse(&self) -> CollapseX {
        CollapseX::new(self.collapse.statistic)
    }

    pub fn value_range(&self) -> ValueRange {
        let unbounded = ValueRange::default();
        ValueRange::new(
            self.value_range.min.unwrap_or(unbounded.min),
            self.value_range.max.unwrap_or(unbounded.max),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Spectrum;

    const PIPELINE: &str = r#"
        [[filters]]
        type = "savitzky-golay"
        left = 1
        right = 1
        polynomial = 1

        [[filters]]
        type = "msc"
        ranges = [[0.0, 10.0]]

        [filters.pre_filter]
        type = "sliding-window"
        half_window = 1
        statistic = "median"

        [[filters]]
        type = "baseline"
        method = "polynomial"
        degree = 1

        [[detectors]]
        type = "amplitude-range"

        [[detectors]]
        type = "swapped"
        flip = true

        [[detectors]]
        type = "point-count"
        min = 10

        [collapse]
        statistic = "stdev"

        [value_range]
        min = 0.0
    "#;

    #[test]
    fn test_parse_pipeline() {
        let config = PipelineConfig::from_str(PIPELINE).unwrap();
        assert_eq!(config.filters.len(), 3);
        assert!(matches!(
            config.filters[0],
            FilterConfig::SavitzkyGolay { polynomial: 1, derivative: 0, left: 1, right: 1 }
        ));
        match &config.filters[1] {
            FilterConfig::Msc { ranges, pre_filter } => {
                assert_eq!(ranges.as_deref(), Some(&[(0.0, 10.0)][..]));
                assert!(matches!(
                    pre_filter.as_deref(),
                    Some(FilterConfig::SlidingWindow { half_window: 1, statistic: Statistic::Median })
                ));
            }
            other => panic!("unexpected filter {other:?}"),
        }
        assert_eq!(config.detectors.len(), 3);
        assert_eq!(config.collapse().statistic, Statistic::Stdev);
        assert_eq!(config.value_range().min, 0.0);
        assert_eq!(config.value_range().max, f64::INFINITY);
    }

    #[test]
    fn test_build_pipeline() {
        let config = PipelineConfig::from_str(PIPELINE).unwrap();
        let mut chain = config.build_filters().unwrap();
        assert_eq!(chain.len(), 3);
        assert!(chain.requires_training());

        let training: Vec<Spectrum> = (1..=3)
            .map(|k| {
                let waves: Vec<f64> = (0..10).map(|i| i as f64).collect();
                let amps: Vec<f64> = waves.iter().map(|w| k as f64 * (1.0 + w)).collect();
                Spectrum::from_arrays(format!("t{k}"), &waves, &amps).unwrap()
            })
            .collect();
        chain.train(&training).unwrap();
        let out = chain.filter(&training[0]).unwrap();
        assert_eq!(out.len(), 8);

        let detectors = config.build_detectors();
        assert!(detectors[0].requires_training());
        assert!(!detectors[1].requires_training());
    }

    #[test]
    fn test_invalid_filter_parameters() {
        let config = PipelineConfig::from_str(
            r#"
            [[filters]]
            type = "savitzky-golay"
            polynomial = 5
            left = 1
            right = 1
            "#,
        )
        .unwrap();
        assert!(config.build_filters().is_err());
    }

    #[test]
    fn test_zero_downsample_step_is_rejected() {
        let config = PipelineConfig::from_str("[[filters]]\ntype = \"downsample\"\nnth = 0\n").unwrap();
        assert!(matches!(
            config.build_filters(),
            Err(processing::ProcessingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unknown_filter_type() {
        assert!(PipelineConfig::from_str("[[filters]]\ntype = \"fourier\"\n").is_err());
    }

    #[test]
    fn test_empty_config() {
        let config = PipelineConfig::from_str("").unwrap();
        assert!(config.build_filters().unwrap().is_empty());
        assert_eq!(config.collapse().statistic, Statistic::Mean);
        assert_eq!(config.value_range(), ValueRange::default());
    }
}
