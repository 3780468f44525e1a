/// Data layer: core containers, file formats, and report-based selection.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv / .sspec        .xyz / .eem
///        │                                     │
///        ▼                                     ▼
///   ┌──────────┐                         ┌──────────┐
///   │  loader   │  dispatch by extension  │  loader   │
///   └──────────┘                         └──────────┘
///        │                                     │
///        ▼                                     ▼
///   ┌────────────────┐                  ┌──────────────┐
///   │ Spectrum/Report │                  │ ThreeWayData │
///   └────────────────┘                  └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ selection │  report predicates → selected indices
///   └──────────┘
/// ```

pub mod formats;
pub mod loader;
pub mod model;
pub mod report;
pub mod selection;
pub mod threeway;
