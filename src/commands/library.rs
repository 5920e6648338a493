//! Command handlers for presets, history and data transfer.

use std::path::Path;
use tracing::{debug, info};

use crate::core::{AppState, ProcessingSettings};
use crate::storage::{ExportData, HistoryEntry, Preset};
use crate::utils::{timestamp_ms, CompressorError, CompressorResult};

pub fn list_presets(state: &AppState) -> Vec<Preset> {
    state.store().load_presets()
}

/// Stores `settings` under `name`, replacing a preset of the same name.
pub fn save_preset(state: &AppState, name: &str, settings: &ProcessingSettings) -> CompressorResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CompressorError::settings("Preset name cannot be empty"));
    }
    let preset = Preset { name: name.to_string(), settings: settings.clone() };
    if !state.store().save_preset(preset) {
        return Err(CompressorError::IO(format!("Failed to save preset '{name}'")));
    }
    debug!("Saved preset '{}'", name);
    Ok(())
}

pub fn load_preset(state: &AppState, name: &str) -> CompressorResult<ProcessingSettings> {
    state
        .store()
        .find_preset(name)
        .map(|p| p.settings)
        .ok_or_else(|| CompressorError::settings(format!("No preset named '{name}'")))
}

pub fn delete_preset(state: &AppState, name: &str) -> bool {
    state.store().delete_preset(name)
}

pub fn rename_preset(state: &AppState, old: &str, new: &str) -> bool {
    state.store().rename_preset(old, new.trim())
}

pub fn show_history(state: &AppState) -> Vec<HistoryEntry> {
    state.store().load_history()
}

pub fn clear_history(state: &AppState) -> bool {
    state.store().clear_history()
}

/// Writes settings, presets and history to `path` as JSON.
pub async fn export_data(state: &AppState, path: &Path) -> CompressorResult<ExportData> {
    let data = state.store().export_data(timestamp_ms());
    let json = serde_json::to_string_pretty(&data)?;
    tokio::fs::write(path, json).await?;
    info!(
        "Exported {} presets and {} history entries to {}",
        data.presets.len(), data.history.len(), path.display()
    );
    Ok(data)
}

/// Loads a file written by [`export_data`] into the store.
pub async fn import_data(state: &AppState, path: &Path) -> CompressorResult<ExportData> {
    let raw = tokio::fs::read_to_string(path).await?;
    let data: ExportData = serde_json::from_str(&raw)
        .map_err(|e| CompressorError::format(format!("Invalid export file {}: {e}", path.display())))?;
    if !state.store().import_data(&data) {
        return Err(CompressorError::IO(format!("Failed to import {}", path.display())));
    }
    info!("Imported data from {}", path.display());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CompressorConfig;
    use tempfile::TempDir;

    fn state(dir: &Path) -> AppState {
        AppState::new(CompressorConfig { store_dir: Some(dir.to_path_buf()), ..Default::default() })
    }

    #[test]
    fn presets_round_through_the_store() {
        let dir = TempDir::new().unwrap();
        let state = state(dir.path());
        let settings = ProcessingSettings { quality: 33, ..Default::default() };

        save_preset(&state, " small ", &settings).unwrap();
        assert_eq!(load_preset(&state, "small").unwrap(), settings);
        assert!(save_preset(&state, "  ", &settings).is_err());
        assert!(rename_preset(&state, "small", "tiny"));
        assert!(load_preset(&state, "small").is_err());
        assert!(delete_preset(&state, "tiny"));
        assert!(list_presets(&state).is_empty());
    }

    #[tokio::test]
    async fn export_and_import_between_stores() {
        let dir = TempDir::new().unwrap();
        let source = state(&dir.path().join("a"));
        save_preset(&source, "web", &ProcessingSettings::default()).unwrap();
        let file = dir.path().join("backup.json");
        export_data(&source, &file).await.unwrap();

        let target = state(&dir.path().join("b"));
        let imported = import_data(&target, &file).await.unwrap();
        assert_eq!(imported.presets.len(), 1);
        assert_eq!(list_presets(&target).len(), 1);
    }

    #[tokio::test]
    async fn malformed_import_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "42").unwrap();
        let err = import_data(&state(dir.path()), &file).await.unwrap_err();
        assert!(matches!(err, CompressorError::Format(_)));
    }
}
