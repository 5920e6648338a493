// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod worker;
pub mod processing;
pub mod storage;
pub mod commands;

// Public exports for external consumers
pub use self::core::{
    AppState,
    CompressorConfig,
    ItemStatus,
    OutputFormat,
    ProcessingResult,
    ProcessingSettings,
    Progress,
    Queue,
    QueueItem,
    SourceImage,
};
pub use processing::{BatchObserver, BatchOutcome, BatchProcessor, ImageProcessor, ProcessedImage};
pub use storage::SettingsStore;
pub use utils::{CompressorError, CompressorResult, ImageFormat};

// The binary in main.rs is a thin command-line front end over this library.
