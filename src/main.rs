use clap::Parser;
use env_logger::Env;
use log::info;

use lcz_transitions::cli::Args;
use lcz_transitions::config::{NoDataPolicy, PipelineConfig};
use lcz_transitions::pipeline::{self, OutputOptions};
use lcz_transitions::Result;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== LCZ Transition Matrix ===");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(epsg) = args.epsg {
        config.reference_epsg = epsg;
    }
    if let Some(nd) = args.nodata {
        config.nodata = NoDataPolicy::Override(nd);
    }
    if !args.exclude.is_empty() {
        config.scheme.excluded = args.exclude.clone();
    }
    config.validate()?;

    info!("Reference system: EPSG:{}", config.reference_epsg);
    info!("Class scheme: {} classes", config.scheme.len());

    let results = pipeline::run(&args.rasters, &args.boundary, &config)?;

    let options = OutputOptions {
        percentages: args.percentages,
        cumulative: args.cumulative,
    };
    let written = pipeline::write_results(&args.output_dir, &results, &config.scheme, options)?;
    info!("Wrote {} file(s) to {}", written.len(), args.output_dir.display());

    info!("=== Done! ===");
    Ok(())
}
