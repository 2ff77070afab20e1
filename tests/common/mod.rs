#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use depth_batch::{DepthArray, DepthModel, InferenceError, PipelineEvent, ProgressObserver};
use image::{Rgb, RgbImage};

/// Depth increases left to right and top to bottom, offset by the red channel
/// of the top-left pixel so different images give different arrays.
pub struct GradientModel;

impl DepthModel for GradientModel {
    fn name(&self) -> &str {
        "gradient"
    }

    fn infer(&self, image: &RgbImage) -> Result<DepthArray, InferenceError> {
        let offset = image.get_pixel(0, 0).0[0] as f32;
        Ok(DepthArray::from_fn(image.width(), image.height(), |x, y| {
            offset + x as f32 * 0.5 + y as f32
        }))
    }
}

/// Always answers with a 1×1 map, violating the size contract.
pub struct ShrinkingModel;

impl DepthModel for ShrinkingModel {
    fn name(&self) -> &str {
        "shrinking"
    }

    fn infer(&self, _image: &RgbImage) -> Result<DepthArray, InferenceError> {
        Ok(DepthArray::from_fn(1, 1, |_, _| 1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    Discovered(usize),
    Started(PathBuf),
    Computing(PathBuf),
    Completed(PathBuf, PathBuf),
    Failed(PathBuf),
}

#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Seen>,
}

impl Recorder {
    pub fn failures(&self) -> Vec<&PathBuf> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Seen::Failed(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Seen::Completed(..)))
            .count()
    }
}

impl ProgressObserver for Recorder {
    fn notify(&mut self, event: &PipelineEvent<'_>) {
        let seen = match event {
            PipelineEvent::Discovered { count } => Seen::Discovered(*count),
            PipelineEvent::Started { path, .. } => Seen::Started(path.to_path_buf()),
            PipelineEvent::Computing { path } => Seen::Computing(path.to_path_buf()),
            PipelineEvent::Completed {
                path,
                visualization,
            } => Seen::Completed(path.to_path_buf(), visualization.to_path_buf()),
            PipelineEvent::Failed { path, .. } => Seen::Failed(path.to_path_buf()),
        };
        self.events.push(seen);
    }
}

/// Write a `width × height` PNG whose top-left red channel is `seed`.
pub fn write_png(path: &Path, width: u32, height: u32, seed: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        if x == 0 && y == 0 {
            Rgb([seed, 0, 0])
        } else {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

pub fn log_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
