//! Feature extractor
//!
//! Decodes an audio file once and runs both back-ends over the shared
//! waveform. Holds no mutable state, so one extractor can serve every
//! worker concurrently. Decode failure fails the extraction atomically;
//! neither back-end produces partial output.

use std::path::{Path, PathBuf};

use thiserror::Error;

use mixsieve_common::record::FeatureRecord;

use crate::backend::{RhythmAnalyzer, SpectralAnalyzer};
use crate::decode;

/// A single file's analysis failed; non-fatal to the batch
#[derive(Debug, Error)]
#[error("Extraction failed for {path}: {cause}")]
pub struct ExtractError {
    pub path: PathBuf,
    pub cause: String,
}

/// Two-back-end feature extractor
#[derive(Default)]
pub struct FeatureExtractor {
    spectral: SpectralAnalyzer,
    rhythm: RhythmAnalyzer,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze one audio file into a feature record.
    pub fn extract(&self, path: &Path) -> Result<FeatureRecord, ExtractError> {
        let fail = |cause: String| ExtractError {
            path: path.to_path_buf(),
            cause,
        };

        let waveform = decode::decode_mono(path).map_err(|e| fail(format!("{e:#}")))?;
        if waveform.samples.is_empty() {
            return Err(fail("no audio samples decoded".to_string()));
        }

        let spectral = self.spectral.analyze(&waveform);
        let rhythm = self.rhythm.analyze(&waveform);

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(
            file = %filename,
            tempo_source1 = spectral.tempo,
            tempo_source2 = rhythm.tempo,
            duration = spectral.duration,
            "Extraction complete"
        );

        Ok(FeatureRecord {
            filename,
            tempo_source1: spectral.tempo,
            duration_source1: spectral.duration,
            zcr_source1: spectral.zero_crossing_rate,
            spectral_contrast: spectral.spectral_contrast,
            danceability: rhythm.danceability,
            energy: rhythm.energy,
            tempo_source2: rhythm.tempo,
            duration_source2: rhythm.duration,
            zcr_source2: rhythm.zero_crossing_rate,
        })
    }
}
