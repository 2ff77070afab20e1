use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::model::ModelConfig;

// ---------------------------------------------------------------------------
// Stem collision handling
// ---------------------------------------------------------------------------

/// What to do when two discovered images share a file stem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Later images get `<stem>_1`, `<stem>_2`, ...
    #[default]
    Suffix,
    /// Later images overwrite earlier artifacts (with a warning).
    Overwrite,
    /// Abort the run before any image is processed.
    Fail,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suffix" => Ok(CollisionPolicy::Suffix),
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "fail" => Ok(CollisionPolicy::Fail),
            other => Err(format!(
                "unknown collision policy '{other}' (expected suffix, overwrite or fail)"
            )),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollisionPolicy::Suffix => "suffix",
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Fail => "fail",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Everything a run needs besides the model instance itself.
///
/// Loaded from JSON and then overridden by command-line flags:
///
/// ```json
/// {
///   "input_folder": "photos",
///   "output_folder": "depth_out",
///   "log_path": "depth_out/depth_log.csv",
///   "on_collision": "suffix",
///   "model": { "backend": "onnx", "encoder": "vitl", "max_depth": 20.0,
///              "checkpoint": "depth_anything_v2_metric_vitl.onnx" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub log_path: PathBuf,
    pub on_collision: CollisionPolicy,
    pub model: ModelConfig,
}

impl RunConfig {
    pub fn new(
        input_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        RunConfig {
            input_folder: input_folder.into(),
            output_folder: output_folder.into(),
            log_path: log_path.into(),
            ..Default::default()
        }
    }

    /// Load a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "json" {
            bail!("Unsupported config extension: .{ext} (expected .json)");
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Check the preconditions that must hold before any work starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let required = [
            ("input folder", &self.input_folder),
            ("output folder", &self.output_folder),
            ("log path", &self.log_path),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, p)| p.as_os_str().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "missing required {}",
                missing.join(", ")
            )));
        }

        if !self.input_folder.exists() {
            return Err(PipelineError::NotFound(self.input_folder.clone()));
        }
        if !self.input_folder.is_dir() {
            return Err(PipelineError::NotADirectory(self.input_folder.clone()));
        }
        Ok(())
    }
}
