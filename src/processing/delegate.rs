//! First-pass size reduction ahead of any explicit format conversion.

use image::imageops::FilterType;
use image::GenericImageView;
use tracing::debug;

use crate::core::WebpMode;
use crate::utils::{CompressorError, CompressorResult, ImageFormat};
use super::encoder::{decode, encode_image};
use super::options::{EncodeParams, EncoderOptions};

/// Lowest quality the reducer steps down to before it starts shrinking pixels.
const MIN_QUALITY_FRACTION: f32 = 0.1;
const QUALITY_STEP: f32 = 0.05;
const DIMENSION_STEP: f64 = 0.9;

/// Inputs of the size-reduction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceOptions {
    pub target_size_bytes: u64,
    pub max_dimension: u32,
    /// Encoding the reducer writes
    pub format_hint: ImageFormat,
    pub quality_fraction: f32,
    pub png_compression: u8,
    pub webp_mode: WebpMode,
}

impl From<&EncoderOptions> for ReduceOptions {
    fn from(options: &EncoderOptions) -> Self {
        let params = options.encode_params();
        Self {
            target_size_bytes: options.target_size_bytes,
            max_dimension: options.max_dimension,
            format_hint: options.target_format,
            quality_fraction: options.quality_fraction,
            png_compression: params.png_compression,
            webp_mode: params.webp_mode,
        }
    }
}

impl ReduceOptions {
    fn params(&self, quality_fraction: f32) -> EncodeParams {
        EncodeParams {
            format: self.format_hint,
            quality_fraction,
            png_compression: self.png_compression,
            webp_mode: self.webp_mode,
        }
    }
}

/// An opaque size-reduction routine.
///
/// Implementations take encoded bytes and return encoded bytes in
/// `format_hint`, as close to `target_size_bytes` as they manage.
pub trait SizeReducer: Send + Sync {
    fn reduce(&self, data: &[u8], options: &ReduceOptions) -> CompressorResult<Vec<u8>>;
}

/// Default reducer: fit the max dimension, then trade quality (and, once
/// quality is exhausted or irrelevant, pixels) for bytes until the budget
/// is met or the attempts run out. The smallest attempt wins.
#[derive(Debug, Clone)]
pub struct IterativeReducer {
    max_iterations: u32,
}

impl Default for IterativeReducer {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

impl IterativeReducer {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations: max_iterations.max(1) }
    }
}

impl SizeReducer for IterativeReducer {
    fn reduce(&self, data: &[u8], options: &ReduceOptions) -> CompressorResult<Vec<u8>> {
        let image = decode(data)?;
        let (width, height) = image.dimensions();
        let source_format = ImageFormat::from_bytes(data);
        let fits_dimension = width.max(height) <= options.max_dimension;
        let same_format = source_format == Some(options.format_hint);

        if fits_dimension && same_format && data.len() as u64 <= options.target_size_bytes {
            debug!("Source already within budget, passing through");
            return Ok(data.to_vec());
        }

        let mut image = if fits_dimension {
            image
        } else {
            image.resize(options.max_dimension, options.max_dimension, FilterType::Lanczos3)
        };

        let mut quality = options.quality_fraction;
        let mut best: Option<Vec<u8>> = None;

        for attempt in 1..=self.max_iterations {
            let params = options.params(quality);
            let encoded = encode_image(&image, &params)?;
            let size = encoded.len() as u64;
            debug!(
                "Reduce attempt {}: {}×{} q={:.2} → {} bytes (budget {})",
                attempt, image.width(), image.height(), quality, size, options.target_size_bytes
            );

            if best.as_ref().is_none_or(|b| encoded.len() < b.len()) {
                best = Some(encoded);
            }
            if size <= options.target_size_bytes {
                break;
            }

            if params.quality_matters() && quality > MIN_QUALITY_FRACTION {
                quality = (quality - QUALITY_STEP).max(MIN_QUALITY_FRACTION);
            } else {
                let w = ((f64::from(image.width()) * DIMENSION_STEP) as u32).max(1);
                let h = ((f64::from(image.height()) * DIMENSION_STEP) as u32).max(1);
                if (w, h) == (image.width(), image.height()) {
                    break;
                }
                image = image.resize_exact(w, h, FilterType::Lanczos3);
            }
        }

        let best = best.ok_or_else(|| CompressorError::encode("Size reduction produced no output"))?;

        // Never hand back something bigger than an acceptable original.
        if fits_dimension && same_format && best.len() >= data.len() {
            return Ok(data.to_vec());
        }
        Ok(best)
    }
}
