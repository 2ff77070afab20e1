use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Serialize;

use crate::error::InferenceError;

// ---------------------------------------------------------------------------
// SourceImage – one discovered input file
// ---------------------------------------------------------------------------

/// An input raster found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Full path to the file.
    pub path: PathBuf,
    /// Path relative to the input folder, used as the log's `filename`.
    pub relative: PathBuf,
    /// File name without directory or extension.
    pub stem: String,
}

impl SourceImage {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        SourceImage {
            path,
            relative,
            stem,
        }
    }

    /// Name written to the run log, with `/` separators on every platform.
    pub fn log_name(&self) -> String {
        self.relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ---------------------------------------------------------------------------
// DepthArray – per-pixel depth estimate
// ---------------------------------------------------------------------------

/// A `height × width` grid of depth values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthArray {
    values: Array2<f32>,
}

impl DepthArray {
    /// Build from row-major values. Fails when `values.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, values: Vec<f32>) -> Result<Self, InferenceError> {
        let len = values.len();
        let values = Array2::from_shape_vec((height as usize, width as usize), values)
            .map_err(|_| {
                InferenceError::MalformedOutput(format!(
                    "{len} values cannot fill a {width}x{height} depth map"
                ))
            })?;
        Ok(DepthArray { values })
    }

    pub fn from_array(values: Array2<f32>) -> Self {
        DepthArray { values }
    }

    /// Build by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let values = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            f(x as u32, y as u32)
        });
        DepthArray { values }
    }

    pub fn width(&self) -> u32 {
        self.values.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.values.nrows() as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Depth at column `x`, row `y`.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        self.values.get((y as usize, x as usize)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    /// `(min, max)` over all values, `None` when empty.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.iter();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// StatisticsRecord – summary of one DepthArray
// ---------------------------------------------------------------------------

/// Summary statistics of a single depth array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsRecord {
    pub quantile05: f64,
    pub quantile95: f64,
    pub mean: f64,
    pub median: f64,
}

impl fmt::Display for StatisticsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "q05={:.4} q95={:.4} mean={:.4} median={:.4}",
            self.quantile05, self.quantile95, self.mean, self.median
        )
    }
}
