//! Spectral back-end (Source1)
//!
//! STFT-based features: frame-averaged zero-crossing rate, 7-band octave
//! spectral contrast, and tempo from autocorrelation of the spectral-flux
//! onset envelope.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::decode::Waveform;

/// Octave-band edges for spectral contrast, in Hz (upper edge is Nyquist)
const CONTRAST_BAND_EDGES: [f32; 7] = [0.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0];

/// Number of spectral-contrast bands
pub const CONTRAST_BANDS: usize = 7;

/// Tempo search range in BPM
const TEMPO_MIN_BPM: f64 = 60.0;
const TEMPO_MAX_BPM: f64 = 180.0;

/// Features reported by the spectral back-end
#[derive(Debug, Clone)]
pub struct SpectralFeatures {
    /// BPM estimate; 0.0 when no rhythmic content is detectable
    pub tempo: f64,
    /// Seconds
    pub duration: f64,
    /// Frame-mean zero-crossing rate in [0, 1]
    pub zero_crossing_rate: f64,
    /// One contrast value per octave band, low to high
    pub spectral_contrast: Vec<f64>,
}

/// STFT feature analyzer
pub struct SpectralAnalyzer {
    fft_size: usize,
    hop_size: usize,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop_size: 512,
        }
    }
}

impl SpectralAnalyzer {
    pub fn new(fft_size: usize, hop_size: usize) -> Self {
        Self { fft_size, hop_size }
    }

    pub fn analyze(&self, waveform: &Waveform) -> SpectralFeatures {
        let frames = self.magnitude_frames(&waveform.samples);

        SpectralFeatures {
            tempo: self.tempo_from_flux(&frames, waveform.sample_rate),
            duration: waveform.duration_seconds(),
            zero_crossing_rate: self.frame_mean_zcr(&waveform.samples),
            spectral_contrast: self.spectral_contrast(&frames, waveform.sample_rate),
        }
    }

    /// Hann-windowed STFT magnitude spectrogram, one Vec per frame.
    fn magnitude_frames(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        if samples.len() < self.fft_size {
            return Vec::new();
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(self.fft_size);

        let window: Vec<f32> = (0..self.fft_size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / self.fft_size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        let num_bins = self.fft_size / 2;
        let mut frames = Vec::new();
        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); self.fft_size];

        let mut pos = 0;
        while pos + self.fft_size <= samples.len() {
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(samples[pos + i] * window[i], 0.0);
            }
            fft.process(&mut buffer);

            frames.push(buffer[..num_bins].iter().map(|c| c.norm()).collect());
            pos += self.hop_size;
        }

        frames
    }

    /// Mean zero-crossing rate over analysis frames.
    fn frame_mean_zcr(&self, samples: &[f32]) -> f64 {
        if samples.len() < 2 {
            return 0.0;
        }

        let frame_size = self.fft_size.min(samples.len());
        let mut rates = Vec::new();

        let mut pos = 0;
        while pos + frame_size <= samples.len() {
            let frame = &samples[pos..pos + frame_size];
            let crossings = frame
                .windows(2)
                .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
                .count();
            rates.push(crossings as f64 / (frame_size - 1) as f64);
            pos += self.hop_size;
        }

        if rates.is_empty() {
            return 0.0;
        }
        rates.iter().sum::<f64>() / rates.len() as f64
    }

    /// Per-band peak/valley log-ratio contrast, averaged over frames.
    ///
    /// Always returns `CONTRAST_BANDS` values so the store's vector length
    /// is stable across files.
    fn spectral_contrast(&self, frames: &[Vec<f32>], sample_rate: u32) -> Vec<f64> {
        if frames.is_empty() {
            return vec![0.0; CONTRAST_BANDS];
        }

        let num_bins = self.fft_size / 2;
        let sr = sample_rate as f32;
        let hz_to_bin = |hz: f32| (hz * self.fft_size as f32 / sr).round() as usize;

        let mut edges: Vec<usize> = CONTRAST_BAND_EDGES.iter().map(|&hz| hz_to_bin(hz)).collect();
        edges.push(num_bins);

        let mut sums = vec![0.0f64; CONTRAST_BANDS];
        for frame in frames {
            for band in 0..CONTRAST_BANDS {
                let start = edges[band].min(num_bins);
                let end = edges[band + 1].min(num_bins);
                if end <= start {
                    continue;
                }

                let mut band_mags: Vec<f32> = frame[start..end].to_vec();
                band_mags.sort_unstable_by(|a, b| {
                    a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                });

                let n = band_mags.len();
                let top = ((n as f32 * 0.2).ceil() as usize).max(1);
                let peak: f32 =
                    band_mags[n - top.min(n)..].iter().sum::<f32>() / top.min(n) as f32;
                let valley: f32 = band_mags[..top.min(n)].iter().sum::<f32>() / top.min(n) as f32;

                sums[band] += f64::from(((peak + 1e-10) / (valley + 1e-10)).log10());
            }
        }

        sums.iter()
            .map(|&sum| sum / frames.len() as f64)
            .collect()
    }

    /// Tempo from autocorrelation of the spectral-flux onset envelope.
    ///
    /// Searches lags corresponding to 60-180 BPM; a flat envelope (steady
    /// tone, silence) yields 0.0.
    fn tempo_from_flux(&self, frames: &[Vec<f32>], sample_rate: u32) -> f64 {
        if frames.len() < 3 {
            return 0.0;
        }

        // Half-wave rectified spectral flux per frame
        let mut envelope = Vec::with_capacity(frames.len() - 1);
        for pair in frames.windows(2) {
            let flux: f32 = pair[1]
                .iter()
                .zip(pair[0].iter())
                .map(|(&cur, &prev)| (cur - prev).max(0.0))
                .sum();
            envelope.push(f64::from(flux));
        }

        let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;

        // A steady spectrum (pure tone, silence) only produces float-noise
        // flux; gate it against the mean frame magnitude before trusting lags
        let mean_frame_magnitude: f64 = frames
            .iter()
            .map(|frame| frame.iter().map(|&m| f64::from(m)).sum::<f64>())
            .sum::<f64>()
            / frames.len() as f64;
        if mean <= mean_frame_magnitude * 1e-3 || mean <= f64::EPSILON {
            return 0.0;
        }
        // Mean-removed envelope so sustained energy does not dominate lags
        let envelope: Vec<f64> = envelope.iter().map(|&v| v - mean).collect();

        let frames_per_second = sample_rate as f64 / self.hop_size as f64;
        let min_lag = ((60.0 / TEMPO_MAX_BPM) * frames_per_second).floor().max(1.0) as usize;
        let max_lag = ((60.0 / TEMPO_MIN_BPM) * frames_per_second).ceil() as usize;
        if max_lag >= envelope.len() || min_lag >= max_lag {
            return 0.0;
        }

        let mut best_lag = 0usize;
        let mut best_corr = 0.0f64;
        for lag in min_lag..=max_lag {
            let corr: f64 = envelope[lag..]
                .iter()
                .zip(envelope.iter())
                .map(|(&a, &b)| a * b)
                .sum();
            if corr > best_corr {
                best_corr = corr;
                best_lag = lag;
            }
        }

        if best_lag == 0 {
            return 0.0;
        }
        60.0 * frames_per_second / best_lag as f64
    }
}
