//! Runtime configuration.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::utils::{CompressorError, CompressorResult};

const MIB: u64 = 1024 * 1024;

/// Tunables for the pipeline, the dispatcher and the store.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressorConfig {
    /// Sources larger than this are offered to a background worker
    pub worker_threshold_bytes: u64,
    /// Background worker cap; derived from hardware concurrency when unset
    pub max_workers: Option<usize>,
    /// Share of the source size the size-reduction pass aims for
    pub budget_ratio: f64,
    /// Longest side allowed when no explicit width/height is given
    pub default_max_dimension: u32,
    /// Soft limit; larger sources are processed with a warning
    pub max_file_size_bytes: u64,
    /// Upper bound on encode attempts in the size-reduction pass
    pub reducer_iterations: u32,
    /// Directory of the settings/presets/history store
    pub store_dir: Option<PathBuf>,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            worker_threshold_bytes: 2 * MIB,
            max_workers: None,
            budget_ratio: 0.9,
            default_max_dimension: 1920,
            max_file_size_bytes: 10 * MIB,
            reducer_iterations: 10,
            store_dir: None,
        }
    }
}

impl CompressorConfig {
    /// Reads a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> CompressorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> CompressorResult<()> {
        if !(self.budget_ratio > 0.0 && self.budget_ratio <= 1.0) {
            return Err(CompressorError::config(format!(
                "budgetRatio must be in (0, 1], got {}", self.budget_ratio
            )));
        }
        if self.default_max_dimension == 0 {
            return Err(CompressorError::config("defaultMaxDimension cannot be 0"));
        }
        if self.max_workers == Some(0) {
            return Err(CompressorError::config("maxWorkers cannot be 0"));
        }
        if self.reducer_iterations == 0 {
            return Err(CompressorError::config("reducerIterations cannot be 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let config = CompressorConfig::load("/definitely/not/here.json").unwrap();
        assert_eq!(config, CompressorConfig::default());
        assert_eq!(config.worker_threshold_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"maxWorkers": 3, "budgetRatio": 0.5}"#).unwrap();

        let config = CompressorConfig::load(&path).unwrap();
        assert_eq!(config.max_workers, Some(3));
        assert_eq!(config.budget_ratio, 0.5);
        assert_eq!(config.default_max_dimension, 1920);
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"budgetRatio": 1.5}"#).unwrap();

        assert!(matches!(CompressorConfig::load(&path), Err(CompressorError::Config(_))));
    }
}
