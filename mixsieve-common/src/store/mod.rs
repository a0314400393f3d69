//! Flat-text record store
//!
//! The store is an append-only UTF-8 text file holding one block per
//! analyzed audio file. A block starts with a `File:` header line and ends
//! at the next header or end of input:
//!
//! ```text
//! File: track.mp3
//!   Tempo (Source1): [118.2] BPM
//!   Duration (Source1): 200.5 seconds
//!   Zero Crossing Rate (Source1): 0.081
//!   Spectral Contrast (Source1): 20.1, 19.2, 18.3, 17.4, 16.5, 15.6, 14.7
//!   Danceability (Source2): (1.3)
//!   Energy (Source2): 0.5
//!   Tempo (Source2): 117.8 BPM
//!   Duration (Source2): 200.6 seconds
//!   Zero Crossing Rate (Source2): 0.079
//!
//! ```
//!
//! The store is the durable boundary between the analyzer and the playlist
//! generator; the two need not run in the same process or at the same time.

mod reader;
mod writer;

pub use reader::read_all;
pub use writer::StoreWriter;

/// Block header prefix
pub const FILE_KEY: &str = "File";

pub const TEMPO_S1_KEY: &str = "Tempo (Source1)";
pub const DURATION_S1_KEY: &str = "Duration (Source1)";
pub const ZCR_S1_KEY: &str = "Zero Crossing Rate (Source1)";
pub const SPECTRAL_CONTRAST_S1_KEY: &str = "Spectral Contrast (Source1)";
pub const DANCEABILITY_S2_KEY: &str = "Danceability (Source2)";
pub const ENERGY_S2_KEY: &str = "Energy (Source2)";
pub const TEMPO_S2_KEY: &str = "Tempo (Source2)";
pub const DURATION_S2_KEY: &str = "Duration (Source2)";
pub const ZCR_S2_KEY: &str = "Zero Crossing Rate (Source2)";
