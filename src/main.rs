use anyhow::Context;
use clap::Parser;
use image_service::config::Config;
use image_service::transform::{
    process_image, FileResource, ImageError, RasterEngine, TransformOptions,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Image Service - transform one image file using image query parameters
#[derive(Parser, Debug)]
#[command(name = "image-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the source image
    #[arg(short, long)]
    input: PathBuf,

    /// Path the transformed image is written to
    #[arg(short, long)]
    output: PathBuf,

    /// Transform parameters, e.g. "w=800&h=600&fit=cover&fm=webp"
    #[arg(short, long, default_value = "")]
    query: String,

    /// Path to configuration file; built-in defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = image_service::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging subsystem: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args, &config) {
        Ok(mime_type) => {
            tracing::info!(
                input = %args.input.display(),
                output = %args.output.display(),
                mime = %mime_type,
                "Image transformed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let status = e
                .downcast_ref::<ImageError>()
                .map(ImageError::to_http_status)
                .unwrap_or(500);
            tracing::error!(
                input = %args.input.display(),
                error = %format!("{:#}", e),
                status,
                "Image transform failed"
            );
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path).map_err(anyhow::Error::msg)?,
        None => Config::default(),
    };
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Transform the input file and write the result, returning its MIME type
fn run(args: &Args, config: &Config) -> anyhow::Result<String> {
    let options = TransformOptions::from_query_string(&args.query);
    tracing::debug!(
        query = %args.query,
        transformations = options.has_transformations(),
        "Parsed transform options"
    );

    let engine = RasterEngine::new(&config.image);
    let mut resource = FileResource::new(&args.input);
    process_image(&mut resource, &options, &engine, &config.image)
        .with_context(|| format!("Failed to transform {}", resource.path().display()))?;

    std::fs::write(&args.output, &resource.body)
        .with_context(|| format!("Failed to write output to {}", args.output.display()))?;

    Ok(resource.mime_type)
}
