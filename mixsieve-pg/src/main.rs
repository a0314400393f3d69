//! mixsieve-pg - Playlist Generator
//!
//! Loads the flat-text feature store, applies inclusive range criteria from
//! the command line, and writes the matching files to an M3U playlist.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mixsieve_common::{filter, playlist, store};
use mixsieve_pg::CriteriaArgs;

#[derive(Parser, Debug)]
#[command(name = "mixsieve-pg", about = "Filter a feature store into an M3U playlist")]
struct Cli {
    /// Record store file to read
    #[arg(default_value = "scanned_db.txt")]
    store: PathBuf,

    /// Root directory the store's filenames are resolved against
    #[arg(long, default_value = ".")]
    audio_root: PathBuf,

    /// Playlist file to write
    #[arg(long, default_value = "playlist.m3u")]
    output: PathBuf,

    /// Config file path (default: $MIXSIEVE_CONFIG or ./mixsieve.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    criteria: CriteriaArgs,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    info!("Starting mixsieve-pg (Playlist Generator)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = mixsieve_common::config::load_or_default(cli.config.as_deref())?;
    let criteria = cli.criteria.to_criteria()?;

    let records = store::read_all(&cli.store, &cli.audio_root, config.reconcile.policy)?;
    info!("Loaded {} records from {}", records.len(), cli.store.display());
    for record in &records {
        for warning in &record.warnings {
            warn!("{warning}");
        }
    }

    let matched = filter::apply(records, &criteria);
    if matched.is_empty() {
        info!("No records matched the criteria; writing an empty playlist");
    }

    playlist::write_m3u(&cli.output, &matched)?;
    info!(
        "Wrote {} entries to {}",
        matched.len(),
        cli.output.display()
    );

    Ok(())
}
