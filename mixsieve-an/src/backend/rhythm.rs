//! Rhythm back-end (Source2)
//!
//! Time-domain features: total signal energy, whole-signal zero-crossing
//! rate, tempo from the median inter-onset interval of short-time RMS
//! peaks, and a danceability score derived from onset regularity.

use crate::decode::Waveform;

/// Shortest plausible beat interval in seconds (240 BPM)
const MIN_BEAT_INTERVAL: f64 = 0.25;
/// Longest plausible beat interval in seconds (30 BPM)
const MAX_BEAT_INTERVAL: f64 = 2.0;

/// Features reported by the rhythm back-end
#[derive(Debug, Clone)]
pub struct RhythmFeatures {
    /// BPM estimate; 0.0 when fewer than two onsets are found
    pub tempo: f64,
    /// Seconds
    pub duration: f64,
    /// Whole-signal zero-crossing rate in [0, 1]
    pub zero_crossing_rate: f64,
    /// Sum of squared samples, non-negative
    pub energy: f64,
    /// Onset regularity scaled into [0, 3]
    pub danceability: f64,
}

/// RMS-envelope rhythm analyzer
pub struct RhythmAnalyzer {
    frame_size: usize,
    hop_size: usize,
}

impl Default for RhythmAnalyzer {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 512,
        }
    }
}

impl RhythmAnalyzer {
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        Self {
            frame_size,
            hop_size,
        }
    }

    pub fn analyze(&self, waveform: &Waveform) -> RhythmFeatures {
        let samples = &waveform.samples;

        let energy = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();

        let zero_crossing_rate = if samples.len() < 2 {
            0.0
        } else {
            let crossings = samples
                .windows(2)
                .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
                .count();
            crossings as f64 / (samples.len() - 1) as f64
        };

        let envelope = self.rms_envelope(samples);
        let intervals = self.onset_intervals(&envelope, waveform.sample_rate);

        let (tempo, danceability) = if intervals.is_empty() {
            (0.0, 0.0)
        } else {
            (tempo_from_intervals(&intervals), regularity_score(&intervals))
        };

        RhythmFeatures {
            tempo,
            duration: waveform.duration_seconds(),
            zero_crossing_rate,
            energy,
            danceability,
        }
    }

    /// Short-time RMS energy envelope.
    fn rms_envelope(&self, samples: &[f32]) -> Vec<f64> {
        let mut envelope = Vec::new();
        let mut pos = 0;
        while pos + self.frame_size <= samples.len() {
            let frame = &samples[pos..pos + self.frame_size];
            let mean_square: f64 = frame
                .iter()
                .map(|&s| f64::from(s) * f64::from(s))
                .sum::<f64>()
                / self.frame_size as f64;
            envelope.push(mean_square.sqrt());
            pos += self.hop_size;
        }
        envelope
    }

    /// Seconds between successive envelope peaks above an adaptive
    /// threshold, keeping only plausible beat intervals.
    fn onset_intervals(&self, envelope: &[f64], sample_rate: u32) -> Vec<f64> {
        if envelope.len() < 3 {
            return Vec::new();
        }

        let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
        let variance = envelope
            .iter()
            .map(|&v| (v - mean) * (v - mean))
            .sum::<f64>()
            / envelope.len() as f64;
        let threshold = mean + variance.sqrt();
        if threshold <= f64::EPSILON {
            return Vec::new();
        }

        let seconds_per_frame = self.hop_size as f64 / sample_rate as f64;
        let mut onsets = Vec::new();
        for i in 1..envelope.len() - 1 {
            if envelope[i] > threshold
                && envelope[i] > envelope[i - 1]
                && envelope[i] >= envelope[i + 1]
            {
                onsets.push(i as f64 * seconds_per_frame);
            }
        }

        onsets
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .filter(|&dt| (MIN_BEAT_INTERVAL..=MAX_BEAT_INTERVAL).contains(&dt))
            .collect()
    }
}

/// Median inter-onset interval converted to BPM.
fn tempo_from_intervals(intervals: &[f64]) -> f64 {
    let mut sorted = intervals.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sorted[sorted.len() / 2];
    if median <= f64::EPSILON {
        return 0.0;
    }
    60.0 / median
}

/// Onset regularity in [0, 3]: perfectly even intervals score 3, erratic
/// ones approach 0. Matches the nominal danceability range.
fn regularity_score(intervals: &[f64]) -> f64 {
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= f64::EPSILON {
        return 0.0;
    }
    let variance = intervals
        .iter()
        .map(|&dt| (dt - mean) * (dt - mean))
        .sum::<f64>()
        / intervals.len() as f64;
    let cv = variance.sqrt() / mean;
    3.0 / (1.0 + cv * 10.0)
}
