//! Batch depth estimation over folders of images.
//!
//! ```text
//!  input folder (jpg/png/bmp/tif)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ discover │  recursive walk → planned images + artifact stems
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ DepthModel   │  RgbImage → DepthArray
//!   └──────────────┘
//!        │
//!        ├──► stats      → StatisticsRecord ──► RunLog (CSV row)
//!        └──► artifacts  → images/<stem>_depth.png + arrays/<stem>_depth.npy
//! ```

pub mod artifacts;
pub mod color;
pub mod config;
pub mod depth;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod run_log;

pub use artifacts::ArtifactWriter;
pub use config::{CollisionPolicy, RunConfig};
pub use depth::model::{DepthArray, StatisticsRecord};
pub use depth::stats::compute;
pub use error::{EmptyArrayError, InferenceError, ModelConfigError, PersistenceError, PipelineError};
pub use model::{DepthModel, EncoderKind, ModelBackend, ModelConfig};
pub use pipeline::{BatchPipeline, LogObserver, PipelineEvent, ProgressObserver, RunSummary, run};
pub use run_log::{LogRow, RunLog};
