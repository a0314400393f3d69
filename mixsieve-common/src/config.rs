//! Configuration loading
//!
//! Config file location follows the priority order:
//! 1. Command-line argument (highest priority)
//! 2. `MIXSIEVE_CONFIG` environment variable
//! 3. `mixsieve.toml` in the working directory (fallback)
//!
//! A missing config file is not an error; compiled defaults apply.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::record::ReconcilePolicy;
use crate::{Error, Result};

/// Environment variable naming an alternate config file
pub const CONFIG_ENV_VAR: &str = "MIXSIEVE_CONFIG";

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mixsieve.toml";

/// Top-level mixsieve configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub reconcile: ReconcileConfig,
}

/// Batch analysis tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Worker pool size; 0 means use available parallelism
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

impl AnalysisConfig {
    /// Bounded pool size after resolving 0 to the machine's parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Dual-source reconciliation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub policy: ReconcilePolicy,
}

/// Resolve the config file path from CLI argument, environment, or default.
///
/// Returns `None` when no candidate file exists on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default.exists() {
        return Some(default);
    }

    None
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Load configuration from the resolved path, falling back to defaults
/// when no config file is present.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Config> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            load_config(&path)
        }
        None => Ok(Config::default()),
    }
}
