//! Audio decoding
//!
//! Decodes a supported container (mp3/wav/flac and anything else symphonia
//! probes) to mono f32 PCM at the file's native sample rate. Both analysis
//! back-ends consume this one waveform.

use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decoded mono waveform
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Mono samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to a mono waveform.
pub fn decode_mono(path: &Path) -> Result<Waveform> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found in file")?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .context("Sample rate not specified in codec params")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e).context("Failed to read packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => downmix_to_mono(&decoded, &mut samples),
            // Corrupt packets are skippable; the rest of the stream decodes
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                debug!("Skipping undecodable packet in {}: {}", path.display(), e);
            }
            Err(e) => return Err(e).context("Failed to decode packet"),
        }
    }

    debug!(
        "Decoded {} mono samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        path.display()
    );

    Ok(Waveform {
        samples,
        sample_rate,
    })
}

fn downmix_to_mono(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => push_mono(&**buf, |s| s, out),
        AudioBufferRef::F64(buf) => push_mono(&**buf, |s| s as f32, out),
        AudioBufferRef::U8(buf) => push_mono(&**buf, |s| (s as f32 - 128.0) / 128.0, out),
        AudioBufferRef::U16(buf) => push_mono(&**buf, |s| (s as f32 - 32768.0) / 32768.0, out),
        AudioBufferRef::U24(buf) => {
            push_mono(&**buf, |s| (s.inner() as f32 - 8388608.0) / 8388608.0, out)
        }
        AudioBufferRef::U32(buf) => {
            push_mono(&**buf, |s| (s as f32 - 2147483648.0) / 2147483648.0, out)
        }
        AudioBufferRef::S8(buf) => push_mono(&**buf, |s| s as f32 / 128.0, out),
        AudioBufferRef::S16(buf) => push_mono(&**buf, |s| s as f32 / 32768.0, out),
        AudioBufferRef::S24(buf) => push_mono(&**buf, |s| s.inner() as f32 / 8388608.0, out),
        AudioBufferRef::S32(buf) => push_mono(&**buf, |s| s as f32 / 2147483648.0, out),
    }
}

fn push_mono<S, F>(buf: &AudioBuffer<S>, to_f32: F, out: &mut Vec<f32>)
where
    S: symphonia::core::sample::Sample + Copy,
    F: Fn(S) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames);

    if channels == 1 {
        out.extend(buf.chan(0).iter().take(frames).map(|&s| to_f32(s)));
    } else {
        for i in 0..frames {
            let mut acc = 0.0f32;
            for ch in 0..channels {
                acc += to_f32(buf.chan(ch)[i]);
            }
            out.push(acc / channels as f32);
        }
    }
}
