//! Concurrent batch analysis
//!
//! Distributes extraction across a bounded worker pool. Workers share one
//! store writer behind a mutex, so appends are serialized and two records
//! can never interleave partial blocks. Per-file failures are caught,
//! logged with the causing path, and reported in the summary; they never
//! abort sibling work. The CPU-bound pool runs inside `spawn_blocking` to
//! keep it off the async runtime.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;

use mixsieve_common::store::StoreWriter;

use crate::extractor::FeatureExtractor;

/// Outcome of one batch run
#[derive(Debug)]
pub struct BatchSummary {
    /// Number of files submitted; every one is attempted exactly once
    pub attempted: usize,
    /// Files whose record reached the store
    pub succeeded: usize,
    /// Per-file failures as (path, reason)
    pub failed: Vec<(PathBuf, String)>,
}

/// Bounded-pool batch runner
pub struct BatchRunner {
    workers: usize,
}

impl BatchRunner {
    /// `workers` is the pool size; clamped to at least 1.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Analyze every file and append the results to the store.
    ///
    /// Returns after all submitted files have been attempted. Re-running
    /// over the same files appends fresh blocks; the store is never
    /// rewritten in place.
    pub async fn run(&self, files: Vec<PathBuf>, store: StoreWriter) -> Result<BatchSummary> {
        let attempted = files.len();
        let workers = self.workers;
        tracing::info!(files = attempted, workers, "Starting batch analysis");

        let started = Instant::now();
        let processed = Arc::new(AtomicUsize::new(0));
        let writer = Arc::new(Mutex::new(store));
        let failures: Arc<Mutex<Vec<(PathBuf, String)>>> = Arc::new(Mutex::new(Vec::new()));

        let processed_counter = processed.clone();
        let writer_handle = writer.clone();
        let failure_sink = failures.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .context("Failed to build worker pool")?;

            let extractor = FeatureExtractor::new();

            pool.install(|| {
                files.par_iter().for_each(|path| {
                    tracing::info!(file = %path.display(), "Analyzing");

                    match extractor.extract(path) {
                        Ok(record) => {
                            let mut writer = writer_handle
                                .lock()
                                .expect("store writer lock poisoned");
                            if let Err(e) = writer.append(&record) {
                                tracing::error!(
                                    file = %path.display(),
                                    error = %e,
                                    "Store append failed"
                                );
                                failure_sink
                                    .lock()
                                    .expect("failure list lock poisoned")
                                    .push((path.clone(), format!("store append: {e}")));
                            }
                        }
                        Err(e) => {
                            tracing::warn!(file = %path.display(), error = %e, "Analysis failed");
                            failure_sink
                                .lock()
                                .expect("failure list lock poisoned")
                                .push((path.clone(), e.cause));
                        }
                    }

                    let done = processed_counter.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 25 == 0 || done == attempted {
                        tracing::info!("Progress: {}/{} files", done, attempted);
                    }
                });
            });

            Ok(())
        })
        .await
        .context("Batch worker task panicked")??;

        let failed = match Arc::try_unwrap(failures) {
            Ok(list) => list.into_inner().expect("failure list lock poisoned"),
            Err(shared) => shared.lock().expect("failure list lock poisoned").clone(),
        };
        let succeeded = attempted - failed.len();

        let elapsed = started.elapsed();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            attempted as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        tracing::info!(
            "Batch complete in {:.1?} | Attempted: {} | Succeeded: {} | Failed: {} | Rate: {:.1} files/sec",
            elapsed,
            attempted,
            succeeded,
            failed.len(),
            rate
        );

        Ok(BatchSummary {
            attempted,
            succeeded,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use mixsieve_common::record::ReconcilePolicy;
    use mixsieve_common::store::read_all;

    use super::*;

    fn write_sine_wav(path: &Path, frequency: f64, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (seconds * 44100.0) as usize;
        for i in 0..frames {
            let t = i as f64 / 44100.0;
            let sample = (2.0 * std::f64::consts::PI * frequency * t).sin();
            writer.write_sample((sample * i16::MAX as f64 * 0.8) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("scanned_db.txt");

        let good_a = dir.path().join("a.wav");
        let good_b = dir.path().join("b.wav");
        let bad = dir.path().join("broken.wav");
        write_sine_wav(&good_a, 440.0, 0.5);
        write_sine_wav(&good_b, 880.0, 0.5);
        std::fs::write(&bad, b"not audio").unwrap();

        let runner = BatchRunner::new(2);
        let summary = runner
            .run(
                vec![good_a, good_b, bad.clone()],
                StoreWriter::new(&store_path),
            )
            .await
            .unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, bad);
        assert_eq!(summary.succeeded + summary.failed.len(), summary.attempted);

        // Every successful file landed as a parseable block
        let records = read_all(&store_path, dir.path(), ReconcilePolicy::Mean).unwrap();
        assert_eq!(records.len(), 2);
        let mut names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["a.wav", "b.wav"]);
    }

    #[tokio::test]
    async fn test_rerun_appends_without_truncating() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("scanned_db.txt");
        let wav = dir.path().join("tone.wav");
        write_sine_wav(&wav, 440.0, 0.5);

        let runner = BatchRunner::new(1);
        runner
            .run(vec![wav.clone()], StoreWriter::new(&store_path))
            .await
            .unwrap();
        runner
            .run(vec![wav], StoreWriter::new(&store_path))
            .await
            .unwrap();

        let records = read_all(&store_path, dir.path(), ReconcilePolicy::Mean).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("scanned_db.txt");

        let summary = BatchRunner::new(4)
            .run(Vec::new(), StoreWriter::new(&store_path))
            .await
            .unwrap();
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.succeeded, 0);
        assert!(summary.failed.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_interleave() {
        let dir = tempfile::TempDir::new().unwrap();
        let store_path = dir.path().join("scanned_db.txt");

        let mut files = Vec::new();
        for i in 0..8 {
            let path = dir.path().join(format!("tone_{i}.wav"));
            write_sine_wav(&path, 200.0 + 100.0 * i as f64, 0.3);
            files.push(path);
        }

        let summary = BatchRunner::new(4)
            .run(files, StoreWriter::new(&store_path))
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 8);

        // Interleaved partial blocks would break the block structure
        let records = read_all(&store_path, dir.path(), ReconcilePolicy::Mean).unwrap();
        assert_eq!(records.len(), 8);
        for record in &records {
            assert!(record.warnings.is_empty(), "torn block: {:?}", record.warnings);
            assert!(record.duration > 0.0);
        }
    }
}
