/// Data layer: core types, discovery, and statistics.
///
/// Architecture:
/// ```text
///  input folder
///        │
///        ▼
///   ┌──────────┐
///   │ discover │  walk tree → Vec<SourceImage>, assign artifact stems
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ DepthArray │  one f32 per pixel, produced by a DepthModel
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats   │  quantiles, mean, median → StatisticsRecord
///   └──────────┘
/// ```

pub mod discover;
pub mod model;
pub mod stats;
