//! Per-format spectrum readers and writers.

pub mod csv;
pub mod json;
pub mod parquet;
pub mod simple;
pub mod threeway;
