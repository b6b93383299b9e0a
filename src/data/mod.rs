/// Data layer: core types, cube I/O, statistics and export.
///
/// Architecture:
/// ```text
///  .fits / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Cube (validated, calibrated)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Extractor   │  location → pixel → SpectrumResult
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats   │  mean, RMS, integrated flux
///   │  export  │  .csv / .json / .parquet
///   └──────────┘
/// ```

pub mod export;
pub mod fits;
pub mod loader;
pub mod model;
pub mod stats;
