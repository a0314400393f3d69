//! Filter engine
//!
//! Evaluates inclusive numeric range criteria against parsed records. Every
//! bound is independently optional; a record must satisfy all supplied
//! criteria (logical AND). Output preserves input order.

use thiserror::Error;

use crate::record::ParsedRecord;

/// Criteria configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum FilterConfigError {
    /// The two spectral-contrast bound vectors have different lengths
    #[error("spectral contrast bounds length mismatch: min has {min}, max has {max}")]
    BoundLengthMismatch { min: usize, max: usize },
}

/// Optional inclusive bounds for one scalar feature
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// True when both bounds are unset
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Inclusive containment; an unset bound always admits.
    pub fn admits(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

/// Component-wise inclusive bounds for the spectral-contrast vector.
///
/// Both bound vectors are supplied together and must be the same length as
/// each other. A record whose vector has a different length (or no vector at
/// all) passes: absence of data is not a filter failure.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRange {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl VectorRange {
    pub fn admits(&self, values: &[f64]) -> bool {
        if values.len() != self.min.len() {
            return true;
        }
        values
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

/// One optional inclusive range per feature. Default (all unset) passes
/// every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub tempo: Range,
    pub duration: Range,
    pub energy: Range,
    pub danceability: Range,
    pub zero_crossing_rate: Range,
    pub spectral_contrast: Option<VectorRange>,
}

impl FilterCriteria {
    /// Reject operator error in the vector bounds before filtering.
    pub fn validate(&self) -> Result<(), FilterConfigError> {
        if let Some(vr) = &self.spectral_contrast {
            if vr.min.len() != vr.max.len() {
                return Err(FilterConfigError::BoundLengthMismatch {
                    min: vr.min.len(),
                    max: vr.max.len(),
                });
            }
        }
        Ok(())
    }

    /// True when the record satisfies every supplied criterion.
    pub fn matches(&self, record: &ParsedRecord) -> bool {
        self.tempo.admits(record.tempo)
            && self.duration.admits(record.duration)
            && self.energy.admits(record.energy)
            && self.danceability.admits(record.danceability)
            && self.zero_crossing_rate.admits(record.zero_crossing_rate)
            && self
                .spectral_contrast
                .as_ref()
                .map(|vr| vr.admits(&record.spectral_contrast))
                .unwrap_or(true)
    }
}

/// Apply the criteria, preserving input order.
pub fn apply(records: Vec<ParsedRecord>, criteria: &FilterCriteria) -> Vec<ParsedRecord> {
    let total = records.len();
    let matched: Vec<ParsedRecord> = records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect();
    tracing::debug!(matched = matched.len(), total, "Filter pass complete");
    matched
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn record(name: &str, tempo: f64, duration: f64, energy: f64) -> ParsedRecord {
        ParsedRecord {
            source_path: PathBuf::from(name),
            filename: name.to_string(),
            tempo_source1: tempo,
            tempo_source2: tempo,
            duration_source1: duration,
            duration_source2: duration,
            zcr_source1: 0.05,
            zcr_source2: 0.05,
            spectral_contrast: vec![1.0, 2.0, 3.0],
            danceability: 1.0,
            energy,
            tempo,
            duration,
            zero_crossing_rate: 0.05,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_no_criteria_passes_all() {
        let records = vec![record("a", 120.0, 200.0, 0.5), record("b", 80.0, 300.0, 0.9)];
        let out = apply(records.clone(), &FilterCriteria::default());
        assert_eq!(out, records);
    }

    #[test]
    fn test_min_only_is_inclusive() {
        let records = vec![
            record("low", 99.9, 0.0, 0.0),
            record("edge", 100.0, 0.0, 0.0),
            record("high", 140.0, 0.0, 0.0),
        ];
        let criteria = FilterCriteria {
            tempo: Range::new(Some(100.0), None),
            ..Default::default()
        };
        let out = apply(records, &criteria);
        let names: Vec<&str> = out.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["edge", "high"]);
    }

    #[test]
    fn test_max_only_is_inclusive() {
        let records = vec![
            record("low", 80.0, 0.0, 0.0),
            record("edge", 100.0, 0.0, 0.0),
            record("high", 100.1, 0.0, 0.0),
        ];
        let criteria = FilterCriteria {
            tempo: Range::new(None, Some(100.0)),
            ..Default::default()
        };
        let out = apply(records, &criteria);
        let names: Vec<&str> = out.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["low", "edge"]);
    }

    #[test]
    fn test_criteria_and_together() {
        let a = record("a", 120.0, 200.0, 0.5);
        let b = record("b", 120.0, 300.0, 0.9);
        let criteria = FilterCriteria {
            tempo: Range::new(Some(100.0), None),
            duration: Range::new(None, Some(250.0)),
            ..Default::default()
        };
        let out = apply(vec![a.clone(), b], &criteria);
        assert_eq!(out, vec![a]);
    }

    #[test]
    fn test_vector_criterion_component_wise() {
        let mut inside = record("inside", 0.0, 0.0, 0.0);
        inside.spectral_contrast = vec![1.5, 2.5, 3.5];
        let mut outside = record("outside", 0.0, 0.0, 0.0);
        outside.spectral_contrast = vec![1.5, 9.0, 3.5];

        let criteria = FilterCriteria {
            spectral_contrast: Some(VectorRange {
                min: vec![1.0, 2.0, 3.0],
                max: vec![2.0, 3.0, 4.0],
            }),
            ..Default::default()
        };
        let out = apply(vec![inside.clone(), outside], &criteria);
        assert_eq!(out, vec![inside]);
    }

    #[test]
    fn test_vector_length_mismatch_passes() {
        let mut short = record("short", 0.0, 0.0, 0.0);
        short.spectral_contrast = vec![100.0];
        let mut empty = record("empty", 0.0, 0.0, 0.0);
        empty.spectral_contrast = Vec::new();

        let criteria = FilterCriteria {
            spectral_contrast: Some(VectorRange {
                min: vec![0.0, 0.0, 0.0],
                max: vec![1.0, 1.0, 1.0],
            }),
            ..Default::default()
        };
        let out = apply(vec![short, empty], &criteria);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_validate_rejects_uneven_bounds() {
        let criteria = FilterCriteria {
            spectral_contrast: Some(VectorRange {
                min: vec![0.0, 0.0],
                max: vec![1.0],
            }),
            ..Default::default()
        };
        assert_eq!(
            criteria.validate(),
            Err(FilterConfigError::BoundLengthMismatch { min: 2, max: 1 })
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![
            record("a", 120.0, 200.0, 0.5),
            record("b", 80.0, 300.0, 0.9),
            record("c", 150.0, 100.0, 0.1),
        ];
        let criteria = FilterCriteria {
            tempo: Range::new(Some(100.0), Some(160.0)),
            ..Default::default()
        };
        let once = apply(records, &criteria);
        let twice = apply(once.clone(), &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zero_matches_is_valid() {
        let records = vec![record("a", 120.0, 200.0, 0.5)];
        let criteria = FilterCriteria {
            tempo: Range::new(Some(500.0), None),
            ..Default::default()
        };
        assert!(apply(records, &criteria).is_empty());
    }
}
