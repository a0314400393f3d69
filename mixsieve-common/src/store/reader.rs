//! Record store reader
//!
//! Line scanner tolerant of partial and malformed blocks. A `File:` line
//! opens a block and flushes the previous one; `Key: Value` lines populate
//! the open block (last duplicate wins); everything else is ignored. The
//! trailing block is flushed at end of input even without a terminator, so
//! a store still being appended to reads cleanly. A field that fails to
//! parse defaults (0.0 scalar, empty vector) and is recorded as a
//! `ParseWarning` on the record; it never fails the block. Dual-reported
//! fields reconcile only when both sources are present and parseable;
//! otherwise the working value stays 0.0.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::record::{round_to, ParseWarning, ParsedRecord, ReconcilePolicy};
use crate::Result;

use super::*;

/// Parse every block of the store into records.
///
/// `audio_root` is joined with each block's raw filename; when the joined
/// path exists on disk it becomes the record's `source_path`, otherwise the
/// raw value is kept. A missing file only affects later playability, never
/// the read.
pub fn read_all(
    store_path: &Path,
    audio_root: &Path,
    policy: ReconcilePolicy,
) -> Result<Vec<ParsedRecord>> {
    let bytes = std::fs::read(store_path)?;
    // Lossy decode: a torn trailing write must not fail the whole read
    let content = String::from_utf8_lossy(&bytes);

    let mut records = Vec::new();
    let mut block: Option<RawBlock> = None;

    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("File:") {
            if let Some(prev) = block.take() {
                records.push(prev.into_record(audio_root, policy));
            }
            block = Some(RawBlock::new(rest.trim().to_string()));
        } else if let Some(open) = block.as_mut() {
            if let Some((key, value)) = line.split_once(": ") {
                open.fields
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
            // Unrecognized lines are ignored
        }
    }

    if let Some(last) = block.take() {
        records.push(last.into_record(audio_root, policy));
    }

    tracing::debug!(
        store = %store_path.display(),
        count = records.len(),
        "Parsed store"
    );
    Ok(records)
}

/// One `File:`-delimited section, raw key/value strings only
struct RawBlock {
    filename: String,
    fields: HashMap<String, String>,
}

impl RawBlock {
    fn new(filename: String) -> Self {
        Self {
            filename,
            fields: HashMap::new(),
        }
    }

    fn into_record(self, audio_root: &Path, policy: ReconcilePolicy) -> ParsedRecord {
        let mut warnings = Vec::new();

        // Absent and unparseable both yield None; the raw record field
        // defaults to 0.0 but reconciliation must know the difference
        let mut scalar = |key: &str| -> Option<f64> {
            let raw = self.fields.get(key)?;
            let value = scrub_scalar(raw);
            if value.is_none() {
                warnings.push(ParseWarning {
                    block: self.filename.clone(),
                    field: key.to_string(),
                });
            }
            value
        };

        let tempo_s1 = scalar(TEMPO_S1_KEY);
        let tempo_s2 = scalar(TEMPO_S2_KEY);
        let duration_s1 = scalar(DURATION_S1_KEY);
        let duration_s2 = scalar(DURATION_S2_KEY);
        let zcr_s1 = scalar(ZCR_S1_KEY);
        let zcr_s2 = scalar(ZCR_S2_KEY);
        let danceability = scalar(DANCEABILITY_S2_KEY).unwrap_or(0.0);
        let energy = scalar(ENERGY_S2_KEY).unwrap_or(0.0);

        let spectral_contrast = match self.fields.get(SPECTRAL_CONTRAST_S1_KEY) {
            Some(raw) => scrub_vector(raw).unwrap_or_else(|| {
                warnings.push(ParseWarning {
                    block: self.filename.clone(),
                    field: SPECTRAL_CONTRAST_S1_KEY.to_string(),
                });
                Vec::new()
            }),
            None => Vec::new(),
        };

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let joined = audio_root.join(&self.filename);
        let source_path = if joined.exists() {
            joined
        } else {
            PathBuf::from(&self.filename)
        };

        // Reconcile only when both sources reported; averaging a defaulted
        // 0.0 in would turn a single-source tempo of 120 into a working
        // value of 60 that range filters would silently trust
        let reconcile = |s1: Option<f64>, s2: Option<f64>, decimals: u32| -> f64 {
            match (s1, s2) {
                (Some(a), Some(b)) => round_to(policy.combine(a, b), decimals),
                _ => 0.0,
            }
        };

        let tempo = reconcile(tempo_s1, tempo_s2, 0);
        let duration = reconcile(duration_s1, duration_s2, 3);
        let zero_crossing_rate = reconcile(zcr_s1, zcr_s2, 3);

        ParsedRecord {
            source_path,
            filename: self.filename,
            tempo_source1: tempo_s1.unwrap_or(0.0),
            tempo_source2: tempo_s2.unwrap_or(0.0),
            duration_source1: duration_s1.unwrap_or(0.0),
            duration_source2: duration_s2.unwrap_or(0.0),
            zcr_source1: zcr_s1.unwrap_or(0.0),
            zcr_source2: zcr_s2.unwrap_or(0.0),
            spectral_contrast,
            danceability,
            energy,
            tempo,
            duration,
            zero_crossing_rate,
            warnings,
        }
    }
}

/// Extract the first numeric token from a decorated value string.
///
/// Tolerates bracket/parenthesis wrapping, unit suffixes (`BPM`, `seconds`)
/// and comma-separated lists: `"[118.2] BPM"` and `"(1.3, 0.9)"` both yield
/// their leading number.
fn scrub_scalar(raw: &str) -> Option<f64> {
    raw.split(|c: char| !matches!(c, '0'..='9' | '.' | '-' | '+'))
        .filter(|token| !token.is_empty())
        .find_map(|token| token.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a comma-separated list of decorated numbers.
///
/// All components must parse or the whole field fails; a partially readable
/// vector would silently change its length and break component-wise
/// filtering.
fn scrub_vector(raw: &str) -> Option<Vec<f64>> {
    let trimmed = raw
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    if trimmed.is_empty() {
        return Some(Vec::new());
    }

    trimmed
        .split(',')
        .map(|component| scrub_scalar(component).ok_or(()))
        .collect::<std::result::Result<Vec<f64>, ()>>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Vec<ParsedRecord> {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("db.txt");
        std::fs::write(&store_path, content).unwrap();
        read_all(&store_path, Path::new("/nonexistent"), ReconcilePolicy::Mean).unwrap()
    }

    #[test]
    fn test_scrub_scalar_decorations() {
        assert_eq!(scrub_scalar("[118.2] BPM"), Some(118.2));
        assert_eq!(scrub_scalar("200.5 seconds"), Some(200.5));
        assert_eq!(scrub_scalar("(1.3, 0.9)"), Some(1.3));
        assert_eq!(scrub_scalar("0.05"), Some(0.05));
        assert_eq!(scrub_scalar("-3.5"), Some(-3.5));
        assert_eq!(scrub_scalar("not a number"), None);
        assert_eq!(scrub_scalar(""), None);
    }

    #[test]
    fn test_scrub_vector() {
        assert_eq!(
            scrub_vector("[20.1, 19.2, -1.5]"),
            Some(vec![20.1, 19.2, -1.5])
        );
        assert_eq!(scrub_vector("1, 2, 3"), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(scrub_vector("1, garbage, 3"), None);
        assert_eq!(scrub_vector("[]"), Some(vec![]));
    }

    #[test]
    fn test_malformed_block_tolerance() {
        // One well-formed block, one missing its spectral contrast line,
        // one truncated trailing block with no terminator.
        let content = "\
File: good.mp3
  Tempo (Source1): [120] BPM
  Duration (Source1): 200 seconds
  Zero Crossing Rate (Source1): 0.08
  Spectral Contrast (Source1): 1, 2, 3
  Danceability (Source2): (1.0)
  Energy (Source2): 0.5
  Tempo (Source2): 118 BPM
  Duration (Source2): 199 seconds
  Zero Crossing Rate (Source2): 0.07

File: no_contrast.mp3
  Tempo (Source1): [90] BPM
  Energy (Source2): 0.2

File: truncated.mp3
  Tempo (Source1): [60] BP";

        let records = parse(content);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].spectral_contrast, vec![1.0, 2.0, 3.0]);
        assert_eq!(records[0].tempo, 119.0);
        assert_eq!(records[0].duration, 199.5);

        assert_eq!(records[1].spectral_contrast, Vec::<f64>::new());
        assert_eq!(records[1].tempo_source1, 90.0);
        assert_eq!(records[1].tempo_source2, 0.0);
        assert!(records[1].warnings.is_empty());

        assert_eq!(records[2].filename, "truncated.mp3");
        assert_eq!(records[2].tempo_source1, 60.0);
    }

    #[test]
    fn test_headerless_prelude_is_skipped() {
        let content = "\
  Tempo (Source1): [999] BPM
stray line

File: real.mp3
  Energy (Source2): 1.5
";
        let records = parse(content);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "real.mp3");
        assert_eq!(records[0].energy, 1.5);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let content = "\
File: dup.mp3
  Energy (Source2): 1.0
  Energy (Source2): 2.0
";
        let records = parse(content);
        assert_eq!(records[0].energy, 2.0);
    }

    #[test]
    fn test_malformed_field_warns_and_defaults() {
        let content = "\
File: bad.mp3
  Tempo (Source1): fast BPM
  Spectral Contrast (Source1): 1, oops
  Energy (Source2): 0.4
";
        let records = parse(content);
        let record = &records[0];
        assert_eq!(record.tempo_source1, 0.0);
        assert_eq!(record.spectral_contrast, Vec::<f64>::new());
        assert_eq!(record.energy, 0.4);
        assert_eq!(record.warnings.len(), 2);
        assert!(record.warnings.iter().any(|w| w.field == TEMPO_S1_KEY));
        assert!(record
            .warnings
            .iter()
            .any(|w| w.field == SPECTRAL_CONTRAST_S1_KEY));
    }

    #[test]
    fn test_audio_root_resolution() {
        let root = tempfile::TempDir::new().unwrap();
        std::fs::write(root.path().join("present.mp3"), b"x").unwrap();

        let store_dir = tempfile::TempDir::new().unwrap();
        let store_path = store_dir.path().join("db.txt");
        std::fs::write(
            &store_path,
            "File: present.mp3\n  Energy (Source2): 1\n\nFile: absent.mp3\n  Energy (Source2): 2\n",
        )
        .unwrap();

        let records = read_all(&store_path, root.path(), ReconcilePolicy::Mean).unwrap();
        assert_eq!(records[0].source_path, root.path().join("present.mp3"));
        assert_eq!(records[1].source_path, PathBuf::from("absent.mp3"));
    }

    #[test]
    fn test_empty_store_yields_no_records() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_single_source_field_is_not_averaged() {
        // Only one back-end reported a tempo; the working value must stay
        // 0.0 rather than become half the reported one
        let content = "\
File: lone.mp3
  Tempo (Source1): [120] BPM
  Duration (Source1): 200 seconds
  Duration (Source2): 201 seconds
";
        let records = parse(content);
        let record = &records[0];

        assert_eq!(record.tempo_source1, 120.0);
        assert_eq!(record.tempo_source2, 0.0);
        assert_eq!(record.tempo, 0.0);
        assert!(record.warnings.is_empty());

        // The pair that both sources reported still reconciles
        assert_eq!(record.duration, 200.5);
    }

    #[test]
    fn test_unparseable_side_blocks_reconciliation() {
        let content = "\
File: half_bad.mp3
  Tempo (Source1): [120] BPM
  Tempo (Source2): fast BPM
";
        let records = parse(content);
        assert_eq!(records[0].tempo_source1, 120.0);
        assert_eq!(records[0].tempo_source2, 0.0);
        assert_eq!(records[0].tempo, 0.0);
        assert_eq!(records[0].warnings.len(), 1);
    }

    #[test]
    fn test_preference_policy_applies() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("db.txt");
        std::fs::write(
            &store_path,
            "File: a.mp3\n  Tempo (Source1): [120] BPM\n  Tempo (Source2): 80 BPM\n",
        )
        .unwrap();

        let records =
            read_all(&store_path, Path::new("/nonexistent"), ReconcilePolicy::Source2).unwrap();
        assert_eq!(records[0].tempo, 80.0);
    }
}
