//! Core types for compression settings and results.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::utils::{CompressorError, ImageFormat};

/// Requested output encoding.
///
/// `Original` keeps whatever encoding the source arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Original,
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// Resolves the concrete encoding for a source of format `source`.
    pub fn resolve(self, source: ImageFormat) -> ImageFormat {
        match self {
            Self::Original => source,
            Self::Jpeg => ImageFormat::JPEG,
            Self::Png => ImageFormat::PNG,
            Self::Webp => ImageFormat::WebP,
        }
    }

    pub fn is_original(self) -> bool {
        self == Self::Original
    }
}

impl FromStr for OutputFormat {
    type Err = CompressorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(CompressorError::format(format!("Unsupported output format: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Rgb,
    Grayscale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebpMode {
    #[default]
    Lossy,
    Lossless,
}

impl FromStr for ColorMode {
    type Err = CompressorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rgb" | "color" => Ok(Self::Rgb),
            "grayscale" | "gray" => Ok(Self::Grayscale),
            other => Err(CompressorError::settings(format!("Unknown color mode: {other}"))),
        }
    }
}

impl FromStr for WebpMode {
    type Err = CompressorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lossy" => Ok(Self::Lossy),
            "lossless" => Ok(Self::Lossless),
            other => Err(CompressorError::settings(format!("Unknown WebP mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl FromStr for WatermarkPosition {
    type Err = CompressorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(CompressorError::settings(format!("Unknown watermark position: {other}"))),
        }
    }
}

/// Text watermark settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkSettings {
    pub enabled: bool,
    pub text: String,
    /// Font size in pixels
    pub font_size: u32,
    /// `#RRGGBB` fill color
    pub color: String,
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f32,
    pub position: WatermarkPosition,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            text: String::new(),
            font_size: 20,
            color: "#FFFFFF".to_string(),
            opacity: 0.7,
            position: WatermarkPosition::BottomRight,
        }
    }
}

/// Configuration settings for one compression run.
///
/// Cloned into every processed item so later edits never reach results
/// that were already produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingSettings {
    pub output_format: OutputFormat,
    /// Quality level (1-100)
    pub quality: u8,
    /// Target width in pixels
    pub width: Option<u32>,
    /// Target height in pixels
    pub height: Option<u32>,
    pub keep_metadata: bool,
    pub color_mode: ColorMode,
    /// PNG compression level (0-9)
    pub png_compression: u8,
    pub webp_mode: WebpMode,
    pub watermark: Option<WatermarkSettings>,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Original,
            quality: 80,
            width: None,
            height: None,
            keep_metadata: false,
            color_mode: ColorMode::Rgb,
            png_compression: 6,
            webp_mode: WebpMode::Lossy,
            watermark: None,
        }
    }
}

/// Bytes produced by the encoders together with what they hold.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub format: ImageFormat,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    /// Output size in bytes
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// Heuristic score; `None` when it could not be derived
    pub quality_score: Option<u8>,
}

impl ProcessingResult {
    pub fn new(encoded: EncodedImage, quality_score: Option<u8>) -> Self {
        Self {
            size: encoded.data.len() as u64,
            mime_type: encoded.format.mime_type(),
            format: encoded.format,
            width: encoded.width,
            height: encoded.height,
            data: encoded.data,
            quality_score,
        }
    }
}
