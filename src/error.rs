use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Failures that stop a run. Everything here aborts the batch; per-image
/// problems are reported as [`InferenceError`] and skipped instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("input folder does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to enumerate {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "artifact stem '{stem}' is shared by {} and {}",
        .first.display(),
        .second.display()
    )]
    StemCollision {
        stem: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Model(#[from] ModelConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

// ---------------------------------------------------------------------------
// Per-image errors
// ---------------------------------------------------------------------------

/// Why a single image produced no depth estimate.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("model rejected input: {0}")]
    Rejected(String),

    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error(transparent)]
    EmptyOutput(#[from] EmptyArrayError),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),
}

/// Statistics were requested over a depth array with no pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot compute statistics of an empty depth array")]
pub struct EmptyArrayError;

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode visualization {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write array {}: {source}", .path.display())]
    Array {
        path: PathBuf,
        #[source]
        source: ndarray_npy::WriteNpyError,
    },

    #[error("failed to append to run log {}: {source}", .path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("artifact {} was written empty", .0.display())]
    EmptyArtifact(PathBuf),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Model configuration errors
// ---------------------------------------------------------------------------

/// Raised while building a model, before any image is touched.
#[derive(Debug, Error)]
pub enum ModelConfigError {
    #[error("unknown encoder '{0}' (expected one of: vits, vitb, vitl, vitg)")]
    UnknownEncoder(String),

    #[error("unknown backend '{0}' (expected one of: luminance, onnx)")]
    UnknownBackend(String),

    #[error("max depth must be a positive finite number, got {0}")]
    InvalidMaxDepth(f32),

    #[error("input size must be a positive multiple of 14, got {0}")]
    InvalidInputSize(u32),

    #[error("the onnx backend needs a checkpoint path")]
    MissingCheckpoint,

    #[error("checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    #[error("backend '{0}' is not available in this build (enable the `{0}` feature)")]
    BackendUnavailable(&'static str),

    #[error("failed to load model {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },
}
