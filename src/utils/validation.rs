use crate::core::{ProcessingSettings, SourceImage};
use crate::utils::{CompressorError, CompressorResult, ValidationError};

/// Non-blocking findings about a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The source exceeds the soft size limit
    Oversized { size: u64, limit: u64 },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversized { size, limit } => write!(
                f,
                "file is {} bytes, above the recommended {} bytes",
                size, limit
            ),
        }
    }
}

/// Validates a source image before it enters the pipeline.
///
/// Non-image MIME types are rejected; oversized files only produce a warning.
pub fn validate_source(source: &SourceImage, max_file_size: u64) -> CompressorResult<Vec<ValidationWarning>> {
    if !source.mime_type.trim().to_lowercase().starts_with("image/") {
        return Err(ValidationError::UnsupportedType(format!(
            "{} ({})", source.name, source.mime_type
        )).into());
    }

    if source.data.is_empty() {
        return Err(ValidationError::EmptyFile(source.name.clone()).into());
    }

    let mut warnings = Vec::new();
    if source.size() > max_file_size {
        warnings.push(ValidationWarning::Oversized {
            size: source.size(),
            limit: max_file_size,
        });
    }
    Ok(warnings)
}

/// Parses a `#RRGGBB` color.
pub fn parse_hex_color(color: &str) -> CompressorResult<[u8; 3]> {
    let hex = color
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| CompressorError::settings(format!(
            "Invalid watermark color: {color}. Expected #RRGGBB"
        )))?;

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => Ok([r, g, b]),
        _ => Err(CompressorError::settings(format!("Invalid watermark color: {color}"))),
    }
}

/// Largest width or height a caller may ask for
pub const MAX_OUTPUT_DIMENSION: u32 = 16_384;

/// Validates image processing settings
pub fn validate_settings(settings: &ProcessingSettings) -> CompressorResult<()> {
    if settings.quality == 0 || settings.quality > 100 {
        return Err(CompressorError::settings(format!(
            "Invalid quality value: {}. Must be between 1 and 100", settings.quality
        )));
    }

    if settings.width == Some(0) {
        return Err(CompressorError::settings("Width cannot be 0"));
    }

    if settings.height == Some(0) {
        return Err(CompressorError::settings("Height cannot be 0"));
    }

    for (name, value) in [("width", settings.width), ("height", settings.height)] {
        if let Some(value) = value.filter(|v| *v > MAX_OUTPUT_DIMENSION) {
            return Err(CompressorError::settings(format!(
                "Invalid {name}: {value}. Must be at most {MAX_OUTPUT_DIMENSION}"
            )));
        }
    }

    if settings.png_compression > 9 {
        return Err(CompressorError::settings(format!(
            "Invalid PNG compression level: {}. Must be between 0 and 9", settings.png_compression
        )));
    }

    if let Some(watermark) = settings.watermark.as_ref().filter(|w| w.enabled) {
        if watermark.font_size == 0 {
            return Err(CompressorError::settings("Watermark font size cannot be 0"));
        }
        if !(0.0..=1.0).contains(&watermark.opacity) {
            return Err(CompressorError::settings(format!(
                "Invalid watermark opacity: {}. Must be between 0 and 1", watermark.opacity
            )));
        }
        if watermark.text.trim().is_empty() {
            return Err(CompressorError::settings("Watermark text cannot be empty"));
        }
        parse_hex_color(&watermark.color)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WatermarkSettings;

    #[test]
    fn non_image_mime_is_rejected() {
        let source = SourceImage::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = validate_source(&source, 1024).unwrap_err();
        assert!(matches!(
            err,
            CompressorError::Validation(ValidationError::UnsupportedType(_))
        ));
    }

    #[test]
    fn oversized_file_only_warns() {
        let source = SourceImage::new("big.png", "image/png", vec![0; 2048]);
        let warnings = validate_source(&source, 1024).unwrap();
        assert_eq!(warnings, vec![ValidationWarning::Oversized { size: 2048, limit: 1024 }]);
    }

    #[test]
    fn quality_bounds() {
        let mut settings = ProcessingSettings::default();
        settings.quality = 0;
        assert!(validate_settings(&settings).is_err());
        settings.quality = 101;
        assert!(validate_settings(&settings).is_err());
        settings.quality = 1;
        assert!(validate_settings(&settings).is_ok());
        settings.quality = 100;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn zero_dimensions_and_bad_png_level_are_rejected() {
        let settings = ProcessingSettings { width: Some(0), ..Default::default() };
        assert!(validate_settings(&settings).is_err());
        let settings = ProcessingSettings { png_compression: 10, ..Default::default() };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let settings = ProcessingSettings {
            width: Some(200_000),
            height: Some(200_000),
            ..Default::default()
        };
        let err = validate_settings(&settings).unwrap_err();
        assert!(matches!(err, CompressorError::Validation(ValidationError::Settings(_))));

        let settings = ProcessingSettings { height: Some(MAX_OUTPUT_DIMENSION + 1), ..Default::default() };
        assert!(validate_settings(&settings).is_err());
        let settings = ProcessingSettings { width: Some(MAX_OUTPUT_DIMENSION), ..Default::default() };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn enabled_watermark_needs_text_and_a_hex_color() {
        let mark = WatermarkSettings { enabled: true, text: "(c)".to_string(), ..Default::default() };
        let with = |mark: WatermarkSettings| ProcessingSettings { watermark: Some(mark), ..Default::default() };

        assert!(validate_settings(&with(mark.clone())).is_ok());
        assert!(validate_settings(&with(WatermarkSettings { text: "  ".to_string(), ..mark.clone() })).is_err());
        assert!(validate_settings(&with(WatermarkSettings { color: "white".to_string(), ..mark })).is_err());
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#FF8000").unwrap(), [255, 128, 0]);
        assert_eq!(parse_hex_color("#00ff7f").unwrap(), [0, 255, 127]);
        assert!(parse_hex_color("FF8000").is_err());
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
    }

    #[test]
    fn disabled_watermark_is_not_checked() {
        let settings = ProcessingSettings {
            watermark: Some(WatermarkSettings { opacity: 4.0, ..Default::default() }),
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_ok());

        let settings = ProcessingSettings {
            watermark: Some(WatermarkSettings {
                enabled: true,
                text: "(c)".to_string(),
                opacity: 4.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_err());
    }
}
