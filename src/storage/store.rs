use std::fs;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::ProcessingSettings;
use crate::processing::BatchOutcome;

const SETTINGS_KEY: &str = "image_compressor_settings";
const PRESETS_KEY: &str = "image_compressor_presets";
const HISTORY_KEY: &str = "image_compressor_history";
const PROBE_KEY: &str = "__storage_test__";

/// A named settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub settings: ProcessingSettings,
}

/// Past compression, kept without any image data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub original_file_name: String,
    pub original_file_size: u64,
    pub original_file_type: String,
    pub compressed_file_size: Option<u64>,
    pub compressed_file_type: Option<String>,
    pub quality_score: Option<u8>,
    pub settings: ProcessingSettings,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl From<&BatchOutcome> for HistoryEntry {
    fn from(outcome: &BatchOutcome) -> Self {
        Self {
            original_file_name: outcome.original_name.clone(),
            original_file_size: outcome.original_size,
            original_file_type: outcome.original_mime.clone(),
            compressed_file_size: Some(outcome.result.size),
            compressed_file_type: Some(outcome.result.mime_type.to_string()),
            quality_score: outcome.result.quality_score,
            settings: outcome.settings.clone(),
            timestamp: outcome.timestamp_ms,
        }
    }
}

/// Everything the store holds, as written by [`SettingsStore::export_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub settings: Option<ProcessingSettings>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub export_date: u64,
}

/// Best-effort key/value persistence of settings, presets and history.
///
/// Each key is one JSON file under `dir`. Nothing here ever fails the
/// caller: writes report `false` and reads report `None` when the store is
/// unusable or the stored data cannot be parsed.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
    available: bool,
}

impl SettingsStore {
    /// Opens the store, probing once whether `dir` can be written.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let available = probe(&dir);
        if !available {
            warn!("Settings store at {} is not available; nothing will be persisted", dir.display());
        }
        Self { dir, available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_settings(&self, settings: &ProcessingSettings) -> bool {
        self.write(SETTINGS_KEY, settings)
    }

    pub fn load_settings(&self) -> Option<ProcessingSettings> {
        self.read(SETTINGS_KEY)
    }

    pub fn save_presets(&self, presets: &[Preset]) -> bool {
        self.write(PRESETS_KEY, &presets)
    }

    /// Stored presets; empty when there are none or they cannot be read.
    pub fn load_presets(&self) -> Vec<Preset> {
        self.read(PRESETS_KEY).unwrap_or_default()
    }

    /// Adds `preset`, replacing any preset with the same name.
    pub fn save_preset(&self, preset: Preset) -> bool {
        let mut presets = self.load_presets();
        match presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => presets.push(preset),
        }
        self.save_presets(&presets)
    }

    pub fn find_preset(&self, name: &str) -> Option<Preset> {
        self.load_presets().into_iter().find(|p| p.name == name)
    }

    /// Removes the preset called `name`. `false` if there was none.
    pub fn delete_preset(&self, name: &str) -> bool {
        let mut presets = self.load_presets();
        let before = presets.len();
        presets.retain(|p| p.name != name);
        if presets.len() == before {
            debug!("No preset named '{}'", name);
            return false;
        }
        self.save_presets(&presets)
    }

    /// Renames a preset. Fails when `old` is missing or `new` is taken.
    pub fn rename_preset(&self, old: &str, new: &str) -> bool {
        let mut presets = self.load_presets();
        if presets.iter().any(|p| p.name == new) {
            warn!("A preset named '{}' already exists", new);
            return false;
        }
        let Some(preset) = presets.iter_mut().find(|p| p.name == old) else {
            debug!("No preset named '{}'", old);
            return false;
        };
        preset.name = new.to_string();
        self.save_presets(&presets)
    }

    pub fn save_history(&self, history: &[HistoryEntry]) -> bool {
        self.write(HISTORY_KEY, &history)
    }

    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.read(HISTORY_KEY).unwrap_or_default()
    }

    /// Appends `entries` to the stored history.
    pub fn append_history(&self, entries: impl IntoIterator<Item = HistoryEntry>) -> bool {
        let mut history = self.load_history();
        history.extend(entries);
        self.save_history(&history)
    }

    pub fn clear_history(&self) -> bool {
        self.remove(HISTORY_KEY)
    }

    pub fn export_data(&self, export_date: u64) -> ExportData {
        ExportData {
            settings: self.load_settings(),
            presets: self.load_presets(),
            history: self.load_history(),
            export_date,
        }
    }

    /// Replaces stored data with whatever `data` carries.
    ///
    /// Absent settings leave the stored settings alone; presets and
    /// history are only overwritten when non-empty.
    pub fn import_data(&self, data: &ExportData) -> bool {
        let mut ok = true;
        if let Some(settings) = &data.settings {
            ok &= self.save_settings(settings);
        }
        if !data.presets.is_empty() {
            ok &= self.save_presets(&data.presets);
        }
        if !data.history.is_empty() {
            ok &= self.save_history(&data.history);
        }
        ok
    }

    pub fn clear_all_data(&self) -> bool {
        [SETTINGS_KEY, PRESETS_KEY, HISTORY_KEY]
            .into_iter()
            .fold(true, |ok, key| self.remove(key) && ok)
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        if !self.available {
            return false;
        }
        let json = match serde_json::to_string_pretty(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize '{}': {}", key, e);
                return false;
            }
        };
        match fs::write(self.path(key), json) {
            Ok(()) => {
                debug!("Saved '{}'", key);
                true
            }
            Err(e) => {
                warn!("Failed to save '{}': {}", key, e);
                false
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.available {
            return None;
        }
        let json = fs::read_to_string(self.path(key)).ok()?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable '{}': {}", key, e);
                None
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        if !self.available {
            return false;
        }
        match fs::remove_file(self.path(key)) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Failed to remove '{}': {}", key, e);
                false
            }
        }
    }
}

fn probe(dir: &Path) -> bool {
    let path = dir.join(PROBE_KEY);
    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, PROBE_KEY))
        .and_then(|()| fs::remove_file(&path))
        .is_ok()
}
