//! The compression pipeline: option mapping, canvas encoding, watermarking,
//! size reduction, scoring and batch coordination.

mod options;
mod encoder;
mod watermark;
mod delegate;
mod quality;
mod pipeline;
mod processor;
pub mod batch;

pub use options::{map_options, target_dimensions, EncodeParams, EncoderOptions, MappingDefaults};
pub use encoder::{check_canvas_size, decode, encode_image, CanvasEncoder, MAX_CANVAS_BYTES};
pub use watermark::apply_watermark;
pub use delegate::{IterativeReducer, ReduceOptions, SizeReducer};
pub use quality::quality_score;
pub use pipeline::Transformer;
pub use processor::{ImageProcessor, ProcessedImage};
pub use batch::{BatchObserver, BatchOutcome, BatchProcessor, NoopObserver};
