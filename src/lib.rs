//! Spectral chemometrics workbench.
//!
//! - [`data`]: spectra, reports, 3-way data and their file formats
//! - [`processing`]: smoothing, scatter/baseline correction, merging, collapsing
//! - [`outlier`]: outlier detectors
//! - [`config`]: TOML pipeline configuration

pub mod config;
pub mod data;
pub mod outlier;
pub mod processing;
