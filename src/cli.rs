use std::path::PathBuf;

use clap::Parser;

use depth_batch::model::{EncoderKind, ModelBackend};
use depth_batch::{CollisionPolicy, RunConfig};

#[derive(Parser, Debug)]
#[command(
    name = "depth-batch",
    version,
    about = "Estimate depth for every image in a folder and log summary statistics"
)]
pub struct Args {
    /// JSON run configuration; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Folder searched recursively for jpg/jpeg/png/bmp/tif/tiff images.
    #[arg(long, short)]
    pub input: Option<PathBuf>,
    /// Output root; artifacts go to `images/` and `arrays/` below it.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// CSV log appended with one row per processed image.
    #[arg(long)]
    pub log: Option<PathBuf>,
    /// What to do when two images share a file stem.
    #[arg(long, value_parser = parse_policy)]
    pub on_collision: Option<CollisionPolicy>,
    /// Model backend: luminance or onnx.
    #[arg(long, value_parser = parse_backend)]
    pub backend: Option<ModelBackend>,
    /// Encoder variant: vits, vitb, vitl or vitg.
    #[arg(long, value_parser = parse_encoder)]
    pub encoder: Option<EncoderKind>,
    /// Model checkpoint (.onnx).
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,
    /// Upper bound of the metric depth range.
    #[arg(long)]
    pub max_depth: Option<f32>,
    /// Shorter side of the network input; multiple of 14.
    #[arg(long)]
    pub input_size: Option<u32>,
    /// Write the run summary as JSON to this path.
    #[arg(long)]
    pub summary: Option<PathBuf>,
    /// List the images that would be processed and exit.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_policy(s: &str) -> Result<CollisionPolicy, String> {
    s.parse()
}

fn parse_backend(s: &str) -> Result<ModelBackend, String> {
    s.parse().map_err(|e: depth_batch::ModelConfigError| e.to_string())
}

fn parse_encoder(s: &str) -> Result<EncoderKind, String> {
    s.parse().map_err(|e: depth_batch::ModelConfigError| e.to_string())
}

impl Args {
    /// Layer the flags over `base` (a loaded config file or defaults).
    pub fn apply(&self, mut base: RunConfig) -> RunConfig {
        if let Some(p) = &self.input {
            base.input_folder = p.clone();
        }
        if let Some(p) = &self.output {
            base.output_folder = p.clone();
        }
        if let Some(p) = &self.log {
            base.log_path = p.clone();
        }
        if let Some(policy) = self.on_collision {
            base.on_collision = policy;
        }
        if let Some(backend) = self.backend {
            base.model.backend = backend;
        }
        if let Some(encoder) = self.encoder {
            base.model.encoder = encoder;
        }
        if let Some(p) = &self.checkpoint {
            base.model.checkpoint = Some(p.clone());
        }
        if let Some(d) = self.max_depth {
            base.model.max_depth = d;
        }
        if let Some(s) = self.input_size {
            base.model.input_size = s;
        }
        base
    }
}
