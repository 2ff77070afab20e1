//! Depth model contract and the backends that implement it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use image::RgbImage;
use log::info;
use serde::{Deserialize, Serialize};

use crate::depth::model::DepthArray;
use crate::error::{InferenceError, ModelConfigError};

pub mod luminance;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;

pub use luminance::LuminanceDepthModel;
#[cfg(feature = "onnx")]
pub use onnx::OnnxDepthModel;

// ---------------------------------------------------------------------------
// Model contract
// ---------------------------------------------------------------------------

/// Maps an RGB image to a per-pixel depth estimate.
///
/// Implementations are constructed once and then only borrowed, so
/// `infer` must be deterministic for a given configuration and input and
/// must return an array with the image's width and height.
pub trait DepthModel {
    /// Short identifier used in progress output.
    fn name(&self) -> &str;

    fn infer(&self, image: &RgbImage) -> Result<DepthArray, InferenceError>;
}

impl<M: DepthModel + ?Sized> DepthModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn infer(&self, image: &RgbImage) -> Result<DepthArray, InferenceError> {
        (**self).infer(image)
    }
}

// ---------------------------------------------------------------------------
// Encoder variants
// ---------------------------------------------------------------------------

/// ViT encoder sizes supported by Depth-Anything-style checkpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EncoderKind {
    Small,
    Base,
    #[default]
    Large,
    Giant,
}

impl EncoderKind {
    pub const ALL: [EncoderKind; 4] = [
        EncoderKind::Small,
        EncoderKind::Base,
        EncoderKind::Large,
        EncoderKind::Giant,
    ];

    /// Identifier used in checkpoint names and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            EncoderKind::Small => "vits",
            EncoderKind::Base => "vitb",
            EncoderKind::Large => "vitl",
            EncoderKind::Giant => "vitg",
        }
    }

    /// Width of the DPT head's fused features.
    pub fn features(self) -> usize {
        match self {
            EncoderKind::Small => 64,
            EncoderKind::Base => 128,
            EncoderKind::Large => 256,
            EncoderKind::Giant => 384,
        }
    }

    /// Channels of the four reassembled feature maps.
    pub fn out_channels(self) -> [usize; 4] {
        match self {
            EncoderKind::Small => [48, 96, 192, 384],
            EncoderKind::Base => [96, 192, 384, 768],
            EncoderKind::Large => [256, 512, 1024, 1024],
            EncoderKind::Giant => [1536, 1536, 1536, 1536],
        }
    }
}

impl FromStr for EncoderKind {
    type Err = ModelConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncoderKind::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelConfigError::UnknownEncoder(s.to_string()))
    }
}

impl TryFrom<String> for EncoderKind {
    type Error = ModelConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EncoderKind> for String {
    fn from(value: EncoderKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Backend selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelBackend {
    /// Brightness-derived reference model; needs no weights.
    #[default]
    Luminance,
    /// ONNX export run through ONNX Runtime (`onnx` feature).
    Onnx,
}

impl ModelBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelBackend::Luminance => "luminance",
            ModelBackend::Onnx => "onnx",
        }
    }
}

impl FromStr for ModelBackend {
    type Err = ModelConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "luminance" => Ok(ModelBackend::Luminance),
            "onnx" => Ok(ModelBackend::Onnx),
            _ => Err(ModelConfigError::UnknownBackend(s.to_string())),
        }
    }
}

impl TryFrom<String> for ModelBackend {
    type Error = ModelConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelBackend> for String {
    fn from(value: ModelBackend) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Model configuration
// ---------------------------------------------------------------------------

/// ViT patch size; network inputs must be a multiple of it.
pub const PATCH_SIZE: u32 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    pub encoder: EncoderKind,
    /// Upper bound of the metric depth range (20 indoor, 80 outdoor).
    pub max_depth: f32,
    /// Shorter side of the network input.
    pub input_size: u32,
    pub checkpoint: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::default(),
            encoder: EncoderKind::default(),
            max_depth: 20.0,
            input_size: 518,
            checkpoint: None,
        }
    }
}

impl ModelConfig {
    /// Reject configurations no backend can run.
    pub fn validate(&self) -> Result<(), ModelConfigError> {
        if !self.max_depth.is_finite() || self.max_depth <= 0.0 {
            return Err(ModelConfigError::InvalidMaxDepth(self.max_depth));
        }
        if self.input_size == 0 || self.input_size % PATCH_SIZE != 0 {
            return Err(ModelConfigError::InvalidInputSize(self.input_size));
        }
        if self.backend == ModelBackend::Onnx {
            if !cfg!(feature = "onnx") {
                return Err(ModelConfigError::BackendUnavailable("onnx"));
            }
            let checkpoint = self
                .checkpoint
                .as_ref()
                .ok_or(ModelConfigError::MissingCheckpoint)?;
            if !checkpoint.is_file() {
                return Err(ModelConfigError::CheckpointNotFound(checkpoint.clone()));
            }
        }
        Ok(())
    }
}

/// Validate `config` and construct the model it describes.
pub fn build(config: &ModelConfig) -> Result<Box<dyn DepthModel>, ModelConfigError> {
    config.validate()?;
    let model: Box<dyn DepthModel> = match config.backend {
        ModelBackend::Luminance => Box::new(LuminanceDepthModel::new(config.max_depth)),
        #[cfg(feature = "onnx")]
        ModelBackend::Onnx => Box::new(OnnxDepthModel::load(config)?),
        #[cfg(not(feature = "onnx"))]
        ModelBackend::Onnx => return Err(ModelConfigError::BackendUnavailable("onnx")),
    };
    info!(
        "loaded {} model (encoder {}, features {}, max depth {})",
        model.name(),
        config.encoder,
        config.encoder.features(),
        config.max_depth
    );
    Ok(model)
}
