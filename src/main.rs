mod cli;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cli::Args;
use depth_batch::{BatchPipeline, LogObserver, RunConfig, model};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let base = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let config = args.apply(base);

    if args.dry_run {
        config.validate()?;
        let images = depth_batch::depth::discover::discover(&config.input_folder)?;
        let planned = depth_batch::depth::discover::plan(images, config.on_collision)?;
        for item in &planned {
            println!("{}\t{}", item.source.path.display(), item.artifact_stem);
        }
        info!("{} image(s) would be processed", planned.len());
        return Ok(());
    }

    // Fail on bad paths before paying for model construction.
    config.validate()?;
    let depth_model = model::build(&config.model).context("building depth model")?;
    let pipeline = BatchPipeline::new(&*depth_model, config)?;
    let summary = pipeline.run(&mut LogObserver)?;

    println!(
        "processed {}/{} image(s), {} failed; log: {}",
        summary.succeeded.len(),
        summary.discovered,
        summary.failed.len(),
        pipeline.config().log_path.display()
    );

    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&summary).context("serializing run summary")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
