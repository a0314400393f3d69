//! Feature-extraction back-ends
//!
//! Two independent analyzers over the same decoded waveform. The spectral
//! back-end is recorded in the store under `Source1` labels, the rhythm
//! back-end under `Source2`. Their tempo/duration/zero-crossing-rate
//! estimates use different methods on purpose, so the dual values the store
//! carries are genuinely independent and worth reconciling at read time.

pub mod rhythm;
pub mod spectral;

pub use rhythm::{RhythmAnalyzer, RhythmFeatures};
pub use spectral::{SpectralAnalyzer, SpectralFeatures};
