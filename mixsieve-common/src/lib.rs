//! # mixsieve Common Library
//!
//! Shared code for the mixsieve binaries including:
//! - Feature record types (raw and parsed views)
//! - Record store serialization (writer + reader)
//! - Filter engine (range criteria over records)
//! - M3U playlist writer
//! - Configuration loading

pub mod config;
pub mod error;
pub mod filter;
pub mod playlist;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use record::{FeatureRecord, ParsedRecord, ReconcilePolicy};
