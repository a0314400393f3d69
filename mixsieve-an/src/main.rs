//! mixsieve-an - Audio Analyzer
//!
//! Scans a directory of audio files, extracts acoustic features with two
//! independent back-ends, and appends one record per file to the flat-text
//! store. The store is later consumed by mixsieve-pg.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mixsieve-an", about = "Analyze audio files into a feature store")]
struct Cli {
    /// Directory containing audio files to analyze
    directory: PathBuf,

    /// Record store file to append to
    #[arg(long, default_value = "scanned_db.txt")]
    store: PathBuf,

    /// Worker pool size (overrides config; 0 = available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Config file path (default: $MIXSIEVE_CONFIG or ./mixsieve.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    info!("Starting mixsieve-an (Audio Analyzer)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = mixsieve_common::config::load_or_default(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.analysis.workers = workers;
    }

    let summary = mixsieve_an::run_batch(&cli.directory, &cli.store, &config).await?;

    info!(
        "Analyzed {} of {} files; results in {}",
        summary.succeeded,
        summary.attempted,
        cli.store.display()
    );
    for (path, reason) in &summary.failed {
        warn!(file = %path.display(), reason, "File skipped");
    }

    Ok(())
}
