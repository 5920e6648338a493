//! Raster re-encoding: decode, resize, grayscale and encode to a target format.

use std::io::Cursor;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};
use tracing::debug;

use crate::core::{ColorMode, EncodedImage, ProcessingSettings, WebpMode};
use crate::utils::{CompressorError, CompressorResult, ImageFormat};
use super::options::{target_dimensions, EncodeParams, EncoderOptions};
use super::watermark::apply_watermark;

/// Largest RGBA surface the canvas step will allocate.
pub const MAX_CANVAS_BYTES: u64 = 512 * 1024 * 1024;

/// Fails when a `width`×`height` RGBA surface would exceed [`MAX_CANVAS_BYTES`].
pub fn check_canvas_size(width: u32, height: u32) -> CompressorResult<()> {
    let bytes = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(4));
    match bytes {
        Some(bytes) if bytes <= MAX_CANVAS_BYTES => Ok(()),
        _ => Err(CompressorError::encode(format!(
            "Canvas of {width}×{height} exceeds the {MAX_CANVAS_BYTES} byte limit"
        ))),
    }
}

/// Decodes `data` into a raster. Failures surface as image load errors.
pub fn decode(data: &[u8]) -> CompressorResult<DynamicImage> {
    image::load_from_memory(data)
        .map_err(|e| CompressorError::decode(format!("Failed to load image: {e}")))
}

/// Encodes `image` with `params`.
///
/// An empty encoder output is reported as an error rather than passed on.
pub fn encode_image(image: &DynamicImage, params: &EncodeParams) -> CompressorResult<Vec<u8>> {
    let data = match params.format {
        ImageFormat::JPEG => encode_jpeg(image, params.quality_percent())?,
        ImageFormat::PNG => encode_png(image, params.png_compression)?,
        ImageFormat::WebP => encode_webp(image, params)?,
        ImageFormat::GIF => encode_generic(&DynamicImage::ImageRgba8(image.to_rgba8()), params.format)?,
        ImageFormat::BMP => {
            let prepared = if image.color().has_alpha() {
                DynamicImage::ImageRgba8(image.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8())
            };
            encode_generic(&prepared, params.format)?
        }
    };

    if data.is_empty() {
        return Err(CompressorError::encode(format!(
            "{} encoder produced no output", params.format
        )));
    }
    Ok(data)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> CompressorResult<Vec<u8>> {
    // JPEG has no alpha channel; transparent pixels keep their underlying color.
    let prepared = if image.color().has_color() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        DynamicImage::ImageLuma8(image.to_luma8())
    };

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    prepared
        .write_with_encoder(encoder)
        .map_err(|e| CompressorError::encode(format!("JPEG encode failed: {e}")))?;
    Ok(buffer)
}

/// Maps the 0-9 zlib-style level onto the PNG encoder presets.
fn png_presets(level: u8) -> (CompressionType, PngFilter) {
    match level {
        0 => (CompressionType::Fast, PngFilter::NoFilter),
        1..=3 => (CompressionType::Fast, PngFilter::Adaptive),
        4..=6 => (CompressionType::Default, PngFilter::Adaptive),
        _ => (CompressionType::Best, PngFilter::Adaptive),
    }
}

fn encode_png(image: &DynamicImage, level: u8) -> CompressorResult<Vec<u8>> {
    let prepared = match image.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        | ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => None,
        _ => Some(DynamicImage::ImageRgba8(image.to_rgba8())),
    };
    let image = prepared.as_ref().unwrap_or(image);

    let (compression, filter) = png_presets(level);
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, filter);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CompressorError::encode(format!("PNG encode failed: {e}")))?;
    Ok(buffer)
}

fn encode_webp(image: &DynamicImage, params: &EncodeParams) -> CompressorResult<Vec<u8>> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let lossless = params.webp_mode == WebpMode::Lossless;

    let memory = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode_simple(lossless, f32::from(params.quality_percent()))
        .map_err(|e| CompressorError::encode(format!("WebP encode failed: {e:?}")))?;
    Ok(memory.to_vec())
}

fn encode_generic(image: &DynamicImage, format: ImageFormat) -> CompressorResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, format.as_image_format())
        .map_err(|e| CompressorError::encode(format!("{format} encode failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Explicit format conversion step.
///
/// Draws the decoded source onto a surface of the requested size, optionally
/// in grayscale and with a text watermark, and encodes it to the resolved
/// target format.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasEncoder;

impl CanvasEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Renders at the size `settings` asks for relative to the decoded image.
    pub fn render(
        &self,
        data: &[u8],
        options: &EncoderOptions,
        settings: &ProcessingSettings,
    ) -> CompressorResult<EncodedImage> {
        let image = decode(data)?;
        let (source_w, source_h) = image.dimensions();
        let size = target_dimensions(settings, source_w, source_h);
        self.draw(image, size, options, settings)
    }

    /// Renders at exactly `width`×`height`.
    pub fn render_at(
        &self,
        data: &[u8],
        (width, height): (u32, u32),
        options: &EncoderOptions,
        settings: &ProcessingSettings,
    ) -> CompressorResult<EncodedImage> {
        self.draw(decode(data)?, (width, height), options, settings)
    }

    fn draw(
        &self,
        image: DynamicImage,
        (width, height): (u32, u32),
        options: &EncoderOptions,
        settings: &ProcessingSettings,
    ) -> CompressorResult<EncodedImage> {
        let (source_w, source_h) = image.dimensions();
        check_canvas_size(width, height)?;

        let image = match settings.color_mode {
            ColorMode::Grayscale => image.grayscale(),
            ColorMode::Rgb => image,
        };
        let image = if (width, height) != (source_w, source_h) {
            image.resize_exact(width, height, FilterType::Lanczos3)
        } else {
            image
        };
        let image = match settings.watermark.as_ref().filter(|w| w.enabled) {
            Some(watermark) => apply_watermark(image, watermark)?,
            None => image,
        };

        let data = encode_image(&image, &options.encode_params())?;
        debug!(
            "Rendered {}×{} → {}×{} as {} ({} bytes)",
            source_w, source_h, width, height, options.target_format, data.len()
        );

        Ok(EncodedImage {
            data,
            format: options.target_format,
            width,
            height,
        })
    }
}
