use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use log::{error, info, warn};
use serde::Serialize;

use crate::artifacts::{ArtifactPaths, ArtifactWriter};
use crate::config::RunConfig;
use crate::depth::discover::{self, PlannedImage};
use crate::depth::model::StatisticsRecord;
use crate::depth::stats;
use crate::error::{InferenceError, PersistenceError, PipelineError};
use crate::model::DepthModel;
use crate::run_log::{LogRow, RunLog};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Notifications emitted while a run progresses.
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    Discovered { count: usize },
    Started { index: usize, total: usize, path: &'a Path },
    Computing { path: &'a Path },
    Completed { path: &'a Path, visualization: &'a Path },
    Failed { path: &'a Path, error: &'a InferenceError },
}

/// Receives [`PipelineEvent`]s. Purely observational; cannot alter the run.
pub trait ProgressObserver {
    fn notify(&mut self, event: &PipelineEvent<'_>);
}

/// Forwards progress to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn notify(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Discovered { count } => info!("found {count} image(s)"),
            PipelineEvent::Started { index, total, path } => {
                info!("[{}/{total}] processing {}", index + 1, path.display())
            }
            PipelineEvent::Computing { path } => info!("computing depth for {}", path.display()),
            PipelineEvent::Completed {
                path,
                visualization,
            } => info!(
                "finished {} -> {}",
                path.display(),
                visualization.display()
            ),
            PipelineEvent::Failed { path, error } => {
                warn!("skipping {}: {error}", path.display())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub visualization: PathBuf,
    pub array: PathBuf,
    pub statistics: StatisticsRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedImage {
    pub source: PathBuf,
    pub reason: String,
}

/// Outcome of a run. `succeeded.len()` equals the rows appended to the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub succeeded: Vec<ProcessedImage>,
    pub failed: Vec<FailedImage>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Sequential batch runner: discover → infer → stats → artifacts → log row.
pub struct BatchPipeline<'m> {
    model: &'m dyn DepthModel,
    config: RunConfig,
    writer: ArtifactWriter,
    log: RunLog,
}

impl<'m> BatchPipeline<'m> {
    /// Check the run preconditions; nothing is written yet.
    pub fn new(model: &'m dyn DepthModel, config: RunConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let log = RunLog::new(&config.log_path);
        Ok(Self {
            model,
            config,
            writer: ArtifactWriter::default(),
            log,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Discover inputs and assign artifact stems without processing anything.
    pub fn plan(&self) -> Result<Vec<PlannedImage>, PipelineError> {
        let images = discover::discover(&self.config.input_folder)?;
        discover::plan(images, self.config.on_collision)
    }

    /// Process every discovered image.
    ///
    /// Per-image inference failures are reported and skipped. A persistence
    /// failure stops the run; images already committed stay on disk.
    pub fn run(&self, observer: &mut dyn ProgressObserver) -> Result<RunSummary, PipelineError> {
        let planned = self.plan()?;
        let total = planned.len();
        observer.notify(&PipelineEvent::Discovered { count: total });

        let output = &self.config.output_folder;
        fs::create_dir_all(output).map_err(|e| PersistenceError::io(output, e))?;

        let mut summary = RunSummary {
            discovered: total,
            ..Default::default()
        };

        for (index, item) in planned.iter().enumerate() {
            let path = item.source.path.as_path();
            observer.notify(&PipelineEvent::Started { index, total, path });

            match self.process(item, observer) {
                Ok(processed) => {
                    observer.notify(&PipelineEvent::Completed {
                        path,
                        visualization: &processed.visualization,
                    });
                    summary.succeeded.push(processed);
                }
                Err(ImageError::Inference(err)) => {
                    observer.notify(&PipelineEvent::Failed { path, error: &err });
                    summary.failed.push(FailedImage {
                        source: path.to_path_buf(),
                        reason: err.to_string(),
                    });
                }
                Err(ImageError::Persistence(err)) => {
                    error!("aborting run at {}: {err}", path.display());
                    return Err(err.into());
                }
            }
        }

        // The log exists after every run, even one with no successes.
        self.log.touch()?;

        Ok(summary)
    }

    fn process(
        &self,
        item: &PlannedImage,
        observer: &mut dyn ProgressObserver,
    ) -> Result<ProcessedImage, ImageError> {
        let path = item.source.path.as_path();
        let image = decode(path)?;

        observer.notify(&PipelineEvent::Computing { path });
        let depth = self.model.infer(&image)?;
        if depth.dimensions() != image.dimensions() {
            return Err(InferenceError::MalformedOutput(format!(
                "model returned {}x{} for a {}x{} image",
                depth.width(),
                depth.height(),
                image.width(),
                image.height()
            ))
            .into());
        }
        drop(image);

        let statistics = stats::compute(&depth).map_err(InferenceError::from)?;
        let output = &self.config.output_folder;
        let visualization = self.writer.persist(output, &item.artifact_stem, &depth)?;
        self.log
            .append(&LogRow::new(item.source.log_name(), &statistics))?;

        Ok(ProcessedImage {
            source: path.to_path_buf(),
            visualization,
            array: ArtifactPaths::new(output, &item.artifact_stem).array,
            statistics,
        })
    }
}

// The format is sniffed from the file's bytes, falling back to the extension,
// so a PNG saved as `.jpg` still decodes.
fn decode(path: &Path) -> Result<RgbImage, InferenceError> {
    let decode_err = |source| InferenceError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let image = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| decode_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)?;
    Ok(image.to_rgb8())
}

// Per-image outcome split: inference problems skip, persistence problems abort.
enum ImageError {
    Inference(InferenceError),
    Persistence(PersistenceError),
}

impl From<InferenceError> for ImageError {
    fn from(e: InferenceError) -> Self {
        ImageError::Inference(e)
    }
}

impl From<PersistenceError> for ImageError {
    fn from(e: PersistenceError) -> Self {
        ImageError::Persistence(e)
    }
}

/// Run the pipeline over `input_folder` with default settings, logging progress.
pub fn run(
    model: &dyn DepthModel,
    input_folder: impl Into<PathBuf>,
    output_folder: impl Into<PathBuf>,
    log_path: impl Into<PathBuf>,
) -> Result<RunSummary, PipelineError> {
    let config = RunConfig::new(input_folder, output_folder, log_path);
    BatchPipeline::new(model, config)?.run(&mut LogObserver)
}
