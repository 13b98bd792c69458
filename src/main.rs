use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use seglens::app::config::AppConfig;
use seglens::app::App;

const DEFAULT_CONFIG: &str = "config/seglens.yaml";

/// Overlay a segmentation mask and detection boxes on still images.
#[derive(Parser, Debug)]
#[command(name = "seglens", version, about)]
struct Args {
    /// YAML config file (defaults to config/seglens.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory, overrides the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Images to process, in order
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            AppConfig::from_file(Path::new(DEFAULT_CONFIG))?
        }
        None => AppConfig::from_env()?,
    };
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    tracing::info!(%config.segmentation, %config.detection, "starting");

    let app = App::start(config).await?;
    let reports = app.run(&args.images).await;
    let failed = args.images.len() - reports.len();
    tracing::info!(processed = reports.len(), failed, "finished");
    if reports.is_empty() {
        return Err("no image could be processed".into());
    }
    Ok(())
}
