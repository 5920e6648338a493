//! Text watermark drawn onto the canvas before encoding.
//!
//! The text is rasterised into a coverage mask first and then blended onto
//! the image, so opacity applies uniformly whatever the image's color type.

use ab_glyph::{FontRef, PxScale};
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use crate::core::{WatermarkPosition, WatermarkSettings};
use crate::utils::{parse_hex_color, CompressorError, CompressorResult};

static FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Distance between the text and the image edges, in pixels
const PADDING: i32 = 10;

/// Top-left corner of a `text_w`×`text_h` box placed in an image of `width`×`height`.
fn anchor(position: WatermarkPosition, (width, height): (u32, u32), (text_w, text_h): (u32, u32)) -> (i32, i32) {
    let right = width as i32 - text_w as i32 - PADDING;
    let bottom = height as i32 - text_h as i32 - PADDING;
    match position {
        WatermarkPosition::TopLeft => (PADDING, PADDING),
        WatermarkPosition::TopRight => (right, PADDING),
        WatermarkPosition::BottomLeft => (PADDING, bottom),
        WatermarkPosition::BottomRight => (right, bottom),
    }
}

/// Draws `watermark` onto `image`.
///
/// The color type is kept: a grayscale image gets the luma of the fill
/// color, an opaque one stays opaque.
pub fn apply_watermark(image: DynamicImage, watermark: &WatermarkSettings) -> CompressorResult<DynamicImage> {
    if watermark.text.is_empty() {
        return Ok(image);
    }

    let [r, g, b] = parse_hex_color(&watermark.color)?;
    let font = FontRef::try_from_slice(FONT_DATA)
        .map_err(|e| CompressorError::encode(format!("Failed to load watermark font: {e}")))?;
    let scale = PxScale::from(watermark.font_size as f32);

    let size = image.dimensions();
    let text_box = text_size(scale, &font, &watermark.text);
    let (x, y) = anchor(watermark.position, size, text_box);
    debug!("Watermark '{}' at ({}, {}) on {}×{}", watermark.text, x, y, size.0, size.1);

    let mut mask = GrayImage::new(size.0, size.1);
    draw_text_mut(&mut mask, Luma([255]), x, y, scale, &font, &watermark.text);

    let color = image.color();
    let mut canvas = image.into_rgba8();
    let opacity = watermark.opacity.clamp(0.0, 1.0);
    for (pixel, coverage) in canvas.pixels_mut().zip(mask.pixels()) {
        if coverage[0] == 0 {
            continue;
        }
        let alpha = f32::from(coverage[0]) / 255.0 * opacity;
        for (channel, fill) in pixel.0.iter_mut().zip([r, g, b]) {
            *channel = (f32::from(*channel) * (1.0 - alpha) + f32::from(fill) * alpha).round() as u8;
        }
        pixel[3] = (f32::from(pixel[3]) * (1.0 - alpha) + 255.0 * alpha).round() as u8;
    }

    let canvas = DynamicImage::ImageRgba8(canvas);
    Ok(match (color.has_color(), color.has_alpha()) {
        (true, true) => canvas,
        (true, false) => DynamicImage::ImageRgb8(canvas.to_rgb8()),
        (false, true) => DynamicImage::ImageLumaA8(canvas.to_luma_alpha8()),
        (false, false) => DynamicImage::ImageLuma8(canvas.to_luma8()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn black(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 0, 0])))
    }

    fn mark(position: WatermarkPosition) -> WatermarkSettings {
        WatermarkSettings {
            enabled: true,
            text: "Sample".to_string(),
            font_size: 24,
            color: "#FFFFFF".to_string(),
            opacity: 1.0,
            position,
        }
    }

    /// Brightest red value inside the given region
    fn peak(image: &DynamicImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> u8 {
        let rgb = image.to_rgb8();
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .map(|(x, y)| rgb.get_pixel(x, y)[0])
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn bottom_right_text_lands_in_that_corner() {
        let out = apply_watermark(black(240, 120), &mark(WatermarkPosition::BottomRight)).unwrap();
        assert!(peak(&out, 120..240, 60..120) > 128);
        assert_eq!(peak(&out, 0..120, 0..60), 0);
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn top_left_text_lands_in_that_corner() {
        let out = apply_watermark(black(240, 120), &mark(WatermarkPosition::TopLeft)).unwrap();
        assert!(peak(&out, 0..120, 0..60) > 128);
        assert_eq!(peak(&out, 120..240, 60..120), 0);
    }

    #[test]
    fn opacity_scales_the_blend() {
        let faint = WatermarkSettings { opacity: 0.25, ..mark(WatermarkPosition::TopLeft) };
        let out = apply_watermark(black(240, 120), &faint).unwrap();
        let value = peak(&out, 0..120, 0..60);
        assert!(value > 0 && value <= 64, "peak {value}");
    }

    #[test]
    fn grayscale_images_stay_grayscale() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(200, 80));
        let out = apply_watermark(gray, &mark(WatermarkPosition::BottomLeft)).unwrap();
        assert!(!out.color().has_color());
        assert!(peak(&out, 0..100, 40..80) > 128);
    }
}
