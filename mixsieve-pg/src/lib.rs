//! mixsieve-pg library
//!
//! Command-line criteria parsing for the playlist generator. The heavy
//! lifting (store parsing, filtering, M3U output) lives in
//! mixsieve-common; this crate turns CLI flags into a `FilterCriteria`.

use clap::Args;

use mixsieve_common::filter::{FilterCriteria, Range, VectorRange};
use mixsieve_common::{Error, Result};

/// Range-filter flags, one optional min/max pair per feature.
///
/// All bounds are inclusive. The spectral-contrast bounds are comma-separated
/// vectors and must be supplied together with equal lengths.
#[derive(Args, Debug, Default, Clone)]
pub struct CriteriaArgs {
    /// Minimum tempo in BPM
    #[arg(long)]
    pub tempo_min: Option<f64>,

    /// Maximum tempo in BPM
    #[arg(long)]
    pub tempo_max: Option<f64>,

    /// Minimum duration in seconds
    #[arg(long)]
    pub duration_min: Option<f64>,

    /// Maximum duration in seconds
    #[arg(long)]
    pub duration_max: Option<f64>,

    /// Minimum energy
    #[arg(long)]
    pub energy_min: Option<f64>,

    /// Maximum energy
    #[arg(long)]
    pub energy_max: Option<f64>,

    /// Minimum danceability
    #[arg(long)]
    pub danceability_min: Option<f64>,

    /// Maximum danceability
    #[arg(long)]
    pub danceability_max: Option<f64>,

    /// Minimum zero-crossing rate
    #[arg(long)]
    pub zcr_min: Option<f64>,

    /// Maximum zero-crossing rate
    #[arg(long)]
    pub zcr_max: Option<f64>,

    /// Per-band spectral contrast minimums, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub contrast_min: Option<Vec<f64>>,

    /// Per-band spectral contrast maximums, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub contrast_max: Option<Vec<f64>>,
}

impl CriteriaArgs {
    /// Build validated filter criteria from the parsed flags.
    pub fn to_criteria(&self) -> Result<FilterCriteria> {
        let spectral_contrast = match (&self.contrast_min, &self.contrast_max) {
            (None, None) => None,
            (Some(min), Some(max)) => Some(VectorRange {
                min: min.clone(),
                max: max.clone(),
            }),
            _ => {
                return Err(Error::InvalidInput(
                    "--contrast-min and --contrast-max must be supplied together".to_string(),
                ))
            }
        };

        let criteria = FilterCriteria {
            tempo: Range::new(self.tempo_min, self.tempo_max),
            duration: Range::new(self.duration_min, self.duration_max),
            energy: Range::new(self.energy_min, self.energy_max),
            danceability: Range::new(self.danceability_min, self.danceability_max),
            zero_crossing_rate: Range::new(self.zcr_min, self.zcr_max),
            spectral_contrast,
        };
        criteria
            .validate()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        Ok(criteria)
    }
}
