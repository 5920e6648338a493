//! Core types and state.
//!
//! - [`AppState`]: processor, batch coordinator and store built from config
//! - [`CompressorConfig`]: runtime tunables
//! - [`ProcessingSettings`]: user-facing settings for one run
//! - [`SourceImage`], [`QueueItem`], [`Queue`]: batch input and its state
//! - [`ProcessingResult`]: output of one pipeline call
//! - [`Progress`]: aggregate progress of a batch run

mod config;
mod state;
mod types;
mod task;
mod progress;

pub use config::CompressorConfig;
pub use state::AppState;
pub use types::{
    ColorMode,
    EncodedImage,
    OutputFormat,
    ProcessingResult,
    ProcessingSettings,
    WatermarkPosition,
    WatermarkSettings,
    WebpMode,
};
pub use task::{ItemStatus, Queue, QueueItem, SourceImage};
pub use progress::{percentage, Progress, ProgressType};
