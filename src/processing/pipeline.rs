//! The synchronous transform that runs on either execution path.

use std::io::Cursor;
use std::sync::Arc;
use image::ImageReader;
use tracing::debug;

use crate::core::{ColorMode, EncodedImage, ProcessingSettings, SourceImage};
use crate::utils::{CompressorError, CompressorResult, ImageFormat};
use super::delegate::{IterativeReducer, ReduceOptions, SizeReducer};
use super::encoder::CanvasEncoder;
use super::options::{map_options, target_dimensions, MappingDefaults};

/// Mapper, size reducer and canvas encoder chained into one blocking call.
///
/// Shared between the calling task and background workers behind an `Arc`;
/// it holds no per-call state.
pub struct Transformer {
    defaults: MappingDefaults,
    reducer: Arc<dyn SizeReducer>,
    canvas: CanvasEncoder,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(MappingDefaults::default(), Arc::new(IterativeReducer::default()))
    }
}

impl Transformer {
    pub fn new(defaults: MappingDefaults, reducer: Arc<dyn SizeReducer>) -> Self {
        Self {
            defaults,
            reducer,
            canvas: CanvasEncoder::new(),
        }
    }

    /// Runs the full transform for one source.
    ///
    /// The size-reduction pass always runs; the canvas step only when an
    /// explicit output format was requested, so that choice always wins, or
    /// when a watermark has to be drawn.
    pub fn transform(&self, source: &SourceImage, settings: &ProcessingSettings) -> CompressorResult<EncodedImage> {
        let source_format = ImageFormat::from_mime(&source.mime_type)
            .or_else(|| ImageFormat::from_bytes(&source.data))
            .ok_or_else(|| CompressorError::format(format!(
                "Unsupported image type for {}: {}", source.name, source.mime_type
            )))?;

        let options = map_options(settings, source.size(), source_format, &self.defaults)?;
        debug!(
            "Transforming '{}' ({} bytes, {}) → {} at q={:.2}",
            source.name, source.size(), source_format, options.target_format, options.quality_fraction
        );

        let watermarked = settings.watermark.as_ref().is_some_and(|w| w.enabled);
        let reduced = self.reducer.reduce(&source.data, &ReduceOptions::from(&options))?;

        if settings.output_format.is_original() {
            if !watermarked {
                let (width, height) = probe_dimensions(&reduced)?;
                return Ok(EncodedImage {
                    data: reduced,
                    format: options.target_format,
                    width,
                    height,
                });
            }
            // Watermark only: the reducer already settled size and encoding
            let plain = ProcessingSettings {
                width: None,
                height: None,
                color_mode: ColorMode::Rgb,
                ..settings.clone()
            };
            return self.canvas.render(&reduced, &options, &plain);
        }

        // Explicit sizes are relative to the source, not to whatever the
        // reducer had to shrink it to.
        let rendered = if settings.width.is_some() || settings.height.is_some() {
            let (source_w, source_h) = probe_dimensions(&source.data)?;
            let size = target_dimensions(settings, source_w, source_h);
            self.canvas.render_at(&reduced, size, &options, settings)?
        } else {
            self.canvas.render(&reduced, &options, settings)?
        };

        // A plain re-encode of bytes that already have the target format and
        // size only loses more quality; keep the smaller of the two.
        let untouched = !watermarked
            && settings.color_mode == ColorMode::Rgb
            && ImageFormat::from_bytes(&reduced) == Some(options.target_format)
            && rendered.data.len() >= reduced.len()
            && probe_dimensions(&reduced)? == (rendered.width, rendered.height);
        if untouched {
            debug!("Re-encode of '{}' did not shrink it, keeping the reduced bytes", source.name);
            return Ok(EncodedImage { data: reduced, ..rendered });
        }

        Ok(rendered)
    }
}

fn probe_dimensions(data: &[u8]) -> CompressorResult<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| CompressorError::decode(format!("Failed to read image dimensions: {e}")))
}
