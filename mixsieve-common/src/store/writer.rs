//! Record store writer
//!
//! Append-only: every call opens the store for append, writes one whole
//! block, and flushes before returning. Existing content is never rewritten
//! or truncated, so a crashed run leaves earlier blocks intact. Workers
//! share a writer behind a `Mutex` so two blocks can never interleave.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::record::FeatureRecord;
use crate::Result;

use super::*;

/// Append-only writer for one store file
pub struct StoreWriter {
    path: PathBuf,
}

impl StoreWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a complete block and flush.
    pub fn append(&mut self, record: &FeatureRecord) -> Result<()> {
        let block = format_block(record);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        file.flush()?;

        tracing::debug!(file = %record.filename, "Appended record to store");
        Ok(())
    }
}

/// Render one record as a store block, trailing blank line included.
fn format_block(record: &FeatureRecord) -> String {
    let contrast = record
        .spectral_contrast
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut block = String::new();
    // Writes to a String cannot fail
    let _ = writeln!(block, "{}: {}", FILE_KEY, record.filename);
    let _ = writeln!(block, "  {}: [{}] BPM", TEMPO_S1_KEY, record.tempo_source1);
    let _ = writeln!(block, "  {}: {} seconds", DURATION_S1_KEY, record.duration_source1);
    let _ = writeln!(block, "  {}: {}", ZCR_S1_KEY, record.zcr_source1);
    let _ = writeln!(block, "  {}: {}", SPECTRAL_CONTRAST_S1_KEY, contrast);
    let _ = writeln!(block, "  {}: ({})", DANCEABILITY_S2_KEY, record.danceability);
    let _ = writeln!(block, "  {}: {}", ENERGY_S2_KEY, record.energy);
    let _ = writeln!(block, "  {}: {} BPM", TEMPO_S2_KEY, record.tempo_source2);
    let _ = writeln!(block, "  {}: {} seconds", DURATION_S2_KEY, record.duration_source2);
    let _ = writeln!(block, "  {}: {}", ZCR_S2_KEY, record.zcr_source2);
    block.push('\n');
    block
}
