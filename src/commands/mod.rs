//! Command handlers behind the command-line front end.
//!
//! - [`compress_image`]: compress one file in memory
//! - [`compress_images`]: batch compress files and directories to disk
//! - presets, history and export/import in [`library`]

mod compress;
pub mod library;

pub use compress::*;
