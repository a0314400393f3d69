//! Typed feature records
//!
//! `FeatureRecord` is the write-side view produced by the analyzer: raw,
//! unrounded per-source values exactly as the back-ends reported them.
//! `ParsedRecord` is the read-side view reconstructed from the store, with
//! reconciled working values computed fresh on every read. Reconciled values
//! are transient and never written back.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One audio file's analysis result, as produced by the two back-ends.
///
/// Scalars are finite and unrounded; the spectral contrast vector preserves
/// the back-end's frequency-band ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Base name of the analyzed file, as recorded in the store
    pub filename: String,
    pub tempo_source1: f64,
    pub duration_source1: f64,
    pub zcr_source1: f64,
    /// One value per frequency band, low to high
    pub spectral_contrast: Vec<f64>,
    pub danceability: f64,
    pub energy: f64,
    pub tempo_source2: f64,
    pub duration_source2: f64,
    pub zcr_source2: f64,
}

/// A field within a store block that could not be parsed and was defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// Filename of the block the field belonged to
    pub block: String,
    /// Store key of the field that failed
    pub field: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: unparseable field '{}', defaulted", self.block, self.field)
    }
}

/// One record reconstructed from the store, with reconciled working values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// Path resolved against the audio root when it exists on disk,
    /// otherwise the raw value recorded in the store
    pub source_path: PathBuf,
    /// Base name as recorded in the block's `File:` header
    pub filename: String,

    // Raw per-source values, defaulted to 0.0 / empty when absent
    pub tempo_source1: f64,
    pub tempo_source2: f64,
    pub duration_source1: f64,
    pub duration_source2: f64,
    pub zcr_source1: f64,
    pub zcr_source2: f64,
    pub spectral_contrast: Vec<f64>,
    pub danceability: f64,
    pub energy: f64,

    // Reconciled working values (policy-combined, fixed rounding);
    // 0.0 when either source's raw field was absent or unparseable
    /// BPM, rounded to the nearest integer
    pub tempo: f64,
    /// Seconds, rounded to 3 decimals
    pub duration: f64,
    /// Rounded to 3 decimals
    pub zero_crossing_rate: f64,

    /// Fields that failed to parse in this block and were defaulted
    pub warnings: Vec<ParseWarning>,
}

/// How dual-reported fields (tempo, duration, zero-crossing-rate) are
/// combined into one working value at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Arithmetic mean of the two sources
    #[default]
    Mean,
    /// Prefer the first back-end's estimate
    Source1,
    /// Prefer the second back-end's estimate
    Source2,
}

impl ReconcilePolicy {
    /// Combine the two sources' estimates of the same quantity.
    pub fn combine(&self, source1: f64, source2: f64) -> f64 {
        match self {
            ReconcilePolicy::Mean => (source1 + source2) / 2.0,
            ReconcilePolicy::Source1 => source1,
            ReconcilePolicy::Source2 => source2,
        }
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
