//! # mixsieve-an - Audio Analyzer
//!
//! Scans a directory for audio files, extracts acoustic features with two
//! independent back-ends, and appends one record per file to the shared
//! flat-text store. Per-file failures are isolated and reported; they never
//! abort sibling work.

pub mod backend;
pub mod batch;
pub mod decode;
pub mod extractor;
pub mod scanner;

use std::path::Path;

use anyhow::Result;
use mixsieve_common::config::Config;
use mixsieve_common::store::StoreWriter;

pub use batch::{BatchRunner, BatchSummary};
pub use extractor::{ExtractError, FeatureExtractor};
pub use scanner::{AudioScanner, ScanError};

/// Analyze every audio file under `directory`, appending results to the
/// store at `store_path`.
pub async fn run_batch(directory: &Path, store_path: &Path, config: &Config) -> Result<BatchSummary> {
    let scanner = AudioScanner::new();
    let files = scanner.scan(directory)?;
    tracing::info!(
        directory = %directory.display(),
        count = files.len(),
        "Audio files discovered"
    );

    let runner = BatchRunner::new(config.analysis.effective_workers());
    runner.run(files, StoreWriter::new(store_path)).await
}
