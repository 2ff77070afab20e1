//! ONNX Runtime backend for Depth-Anything-style exports.

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use log::debug;
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use super::{DepthModel, EncoderKind, ModelConfig, preprocess};
use crate::depth::model::DepthArray;
use crate::error::{InferenceError, ModelConfigError};

/// A loaded ONNX session plus the preprocessing parameters it expects.
///
/// `Session::run` needs `&mut`, so the session sits behind a mutex; the
/// pipeline is single-threaded and never contends on it.
pub struct OnnxDepthModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    name: String,
    input_size: u32,
    max_depth: f32,
}

impl OnnxDepthModel {
    /// Load the checkpoint named by `config`. Call after `config.validate()`.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelConfigError> {
        let path = config
            .checkpoint
            .clone()
            .ok_or(ModelConfigError::MissingCheckpoint)?;
        let load_err = |e: ort::Error| ModelConfigError::Load {
            path: path.clone(),
            message: e.to_string(),
        };

        let session = Session::builder()
            .and_then(|b| b.with_log_level(LogLevel::Error))
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(&path))
            .map_err(load_err)?;

        let input_name =
            first_name(&path, session.inputs.first().map(|i| i.name.clone()), "inputs")?;
        let output_name =
            first_name(&path, session.outputs.first().map(|o| o.name.clone()), "outputs")?;
        debug!(
            "onnx session {}: input '{input_name}', output '{output_name}'",
            path.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            name: model_name(config.encoder),
            input_size: config.input_size,
            max_depth: config.max_depth,
        })
    }
}

fn first_name(
    path: &Path,
    name: Option<String>,
    kind: &str,
) -> Result<String, ModelConfigError> {
    name.ok_or_else(|| ModelConfigError::Load {
        path: path.to_path_buf(),
        message: format!("model declares no {kind}"),
    })
}

fn model_name(encoder: EncoderKind) -> String {
    format!("onnx-{encoder}")
}

impl DepthModel for OnnxDepthModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&self, image: &RgbImage) -> Result<DepthArray, InferenceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(InferenceError::Rejected("image has no pixels".to_string()));
        }
        let input = preprocess::prepare_input(image, self.input_size);
        let tensor = TensorRef::from_array_view(input.view())?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Rejected("onnx session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;
        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        preprocess::finalize_output(shape, data, image.width(), image.height(), self.max_depth)
    }
}
