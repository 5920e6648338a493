//! JSON-file persistence for settings, presets and history.

mod store;

pub use store::{ExportData, HistoryEntry, Preset, SettingsStore};
