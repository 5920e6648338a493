//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::core::CompressorConfig;
use crate::processing::{BatchProcessor, ImageProcessor};
use crate::storage::SettingsStore;

const STORE_DIR_NAME: &str = ".image-compressor";

/// Everything a front end needs, built once from a [`CompressorConfig`].
///
/// Clones share the same processor, so the worker cap and the
/// one-batch-at-a-time rule hold across all of them.
#[derive(Clone)]
pub struct AppState {
    config: Arc<CompressorConfig>,
    batch: Arc<BatchProcessor>,
    store: SettingsStore,
}

impl AppState {
    pub fn new(config: CompressorConfig) -> Self {
        let store_dir = config.store_dir.clone().unwrap_or_else(default_store_dir);
        let processor = ImageProcessor::new(&config);
        debug!(
            "AppState initialized ({} workers, store at {})",
            processor.dispatcher().worker_count(),
            store_dir.display()
        );

        Self {
            config: Arc::new(config),
            batch: Arc::new(BatchProcessor::new(processor)),
            store: SettingsStore::new(store_dir),
        }
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn processor(&self) -> &ImageProcessor {
        self.batch.processor()
    }

    pub fn batch(&self) -> &BatchProcessor {
        &self.batch
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }
}

/// `$HOME/.image-compressor`, or the working directory when `HOME` is unset.
fn default_store_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_DIR_NAME)
}
