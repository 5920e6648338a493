//! Maps user-facing [`ProcessingSettings`] to concrete encoder options.

use crate::core::{CompressorConfig, ProcessingSettings, WebpMode};
use crate::utils::{CompressorError, CompressorResult, ImageFormat};

/// Defaults the mapper falls back on when settings leave a knob open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingDefaults {
    /// Share of the source size the size-reduction pass aims for
    pub budget_ratio: f64,
    /// Longest side when neither width nor height is given
    pub max_dimension: u32,
}

impl Default for MappingDefaults {
    fn default() -> Self {
        Self {
            budget_ratio: 0.9,
            max_dimension: 1920,
        }
    }
}

impl From<&CompressorConfig> for MappingDefaults {
    fn from(config: &CompressorConfig) -> Self {
        Self {
            budget_ratio: config.budget_ratio,
            max_dimension: config.default_max_dimension,
        }
    }
}

/// Resolved options for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOptions {
    /// Byte budget for the size-reduction pass
    pub target_size_bytes: u64,
    /// Longest side allowed by the size-reduction pass
    pub max_dimension: u32,
    pub target_format: ImageFormat,
    /// Quality normalised to 0.0..=1.0
    pub quality_fraction: f32,
    pub preserve_metadata: bool,
    /// Set only when `target_format` is PNG
    pub png_compression: Option<u8>,
    /// Set only when `target_format` is WebP
    pub webp_mode: Option<WebpMode>,
}

impl EncoderOptions {
    /// Encoder parameters at this run's quality.
    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams {
            format: self.target_format,
            quality_fraction: self.quality_fraction,
            png_compression: self.png_compression.unwrap_or(DEFAULT_PNG_COMPRESSION),
            webp_mode: self.webp_mode.unwrap_or_default(),
        }
    }
}

const DEFAULT_PNG_COMPRESSION: u8 = 6;

/// Everything a single encode call needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub format: ImageFormat,
    pub quality_fraction: f32,
    pub png_compression: u8,
    pub webp_mode: WebpMode,
}

impl EncodeParams {
    /// Whether lowering `quality_fraction` shrinks the output
    pub fn quality_matters(&self) -> bool {
        match self.format {
            ImageFormat::JPEG => true,
            ImageFormat::WebP => self.webp_mode == WebpMode::Lossy,
            _ => false,
        }
    }

    /// Quality on the 1-100 scale the encoders take
    pub fn quality_percent(&self) -> u8 {
        (self.quality_fraction * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Maps `settings` for a source of `source_size` bytes encoded as `source_format`.
///
/// Fails on a quality of 0 or an empty source.
pub fn map_options(
    settings: &ProcessingSettings,
    source_size: u64,
    source_format: ImageFormat,
    defaults: &MappingDefaults,
) -> CompressorResult<EncoderOptions> {
    if settings.quality == 0 {
        return Err(CompressorError::settings("Quality must be positive"));
    }
    if source_size == 0 {
        return Err(CompressorError::settings("Source size must be positive"));
    }

    let target_format = settings.output_format.resolve(source_format);
    let max_dimension = match (settings.width, settings.height) {
        (None, None) => defaults.max_dimension,
        (w, h) => w.unwrap_or(0).max(h.unwrap_or(0)),
    };

    Ok(EncoderOptions {
        target_size_bytes: (source_size as f64 * defaults.budget_ratio) as u64,
        max_dimension,
        target_format,
        quality_fraction: f32::from(settings.quality.min(100)) / 100.0,
        preserve_metadata: settings.keep_metadata,
        png_compression: (target_format == ImageFormat::PNG).then_some(settings.png_compression),
        webp_mode: (target_format == ImageFormat::WebP).then_some(settings.webp_mode),
    })
}

/// Output dimensions for a `source_width`×`source_height` image.
///
/// A lone width or height keeps the aspect ratio; both given are applied
/// independently; neither keeps the source size.
pub fn target_dimensions(settings: &ProcessingSettings, source_width: u32, source_height: u32) -> (u32, u32) {
    let scale = |target: u32, from: u32, other: u32| -> u32 {
        let derived = (f64::from(target) / f64::from(from.max(1))) * f64::from(other);
        (derived as u32).max(1)
    };

    match (settings.width, settings.height) {
        (Some(w), None) => (w, scale(w, source_width, source_height)),
        (None, Some(h)) => (scale(h, source_height, source_width), h),
        (Some(w), Some(h)) => (w, h),
        (None, None) => (source_width, source_height),
    }
}
