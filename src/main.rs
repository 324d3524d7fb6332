use std::{fs::File, path::PathBuf, sync::Mutex};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wordbubbles::{config::Settings, data::Dataset};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with the items to show.
    dataset: PathBuf,
    /// JSON settings file. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    frame_rate: Option<u32>,
    #[arg(long)]
    crowdedness: Option<f32>,
    /// Write logs here. Without it logs are discarded so the screen stays clean.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut settings = match &args.config {
        Some(path) => Settings::from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(frame_rate) = args.frame_rate {
        settings.frame_rate = frame_rate;
    }
    if let Some(crowdedness) = args.crowdedness {
        settings.crowdedness = crowdedness;
    }
    settings.validate().context("invalid settings")?;

    let dataset = Dataset::from_path(&args.dataset)
        .with_context(|| format!("loading dataset from {}", args.dataset.display()))?;
    info!(
        "wordbubbles v{} with {} items",
        env!("CARGO_PKG_VERSION"),
        dataset.len()
    );

    wordbubbles::ui::run(dataset, settings, args.seed)
}

fn init_logging(log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}
