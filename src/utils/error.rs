//! Error types for the image compressor.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use thiserror::Error;

use crate::worker::WorkerError;

/// Validation errors for source images and settings.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The source is not an image at all
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    /// The source holds no bytes
    #[error("Empty file: {0}")]
    EmptyFile(String),
    /// Invalid settings error
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Main error type for the compressor.
///
/// Every pipeline failure is converted to this type before it reaches the
/// single-image caller or the batch coordinator.
#[derive(Error, Debug)]
pub enum CompressorError {
    /// Source or settings validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The image could not be decoded
    #[error("Image load error: {0}")]
    Decode(String),

    /// Re-encoding produced no output or failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Background execution failed
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Unsupported or invalid image format
    #[error("Format error: {0}")]
    Format(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// A batch run is already in flight on this processor
    #[error("A batch is already being processed")]
    Busy,
}

/// Convenience result type for compressor operations.
pub type CompressorResult<T> = Result<T, CompressorError>;

// Helper methods for error creation
impl CompressorError {
    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn settings<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::Settings(msg.into()))
    }
}

impl From<io::Error> for CompressorError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<serde_json::Error> for CompressorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
