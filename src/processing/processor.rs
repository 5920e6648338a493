//! Single-image entry point: validation, dispatch and scoring.

use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::{CompressorConfig, ProcessingResult, ProcessingSettings, SourceImage};
use crate::utils::{validate_settings, validate_source, CompressorResult};
use crate::worker::{ExecutionPath, WorkerDispatcher, WorkerJob};
use super::delegate::{IterativeReducer, SizeReducer};
use super::options::MappingDefaults;
use super::pipeline::Transformer;
use super::quality::quality_score;

/// Result of [`ImageProcessor::process_image`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    pub result: ProcessingResult,
    /// Which execution path produced the result
    pub path: ExecutionPath,
}

/// Validates, dispatches and scores one source at a time.
#[derive(Clone)]
pub struct ImageProcessor {
    transformer: Arc<Transformer>,
    dispatcher: WorkerDispatcher,
    max_file_size: u64,
}

impl ImageProcessor {
    pub fn new(config: &CompressorConfig) -> Self {
        Self::with_reducer(config, Arc::new(IterativeReducer::new(config.reducer_iterations)))
    }

    /// Builds a processor around a custom size-reduction routine.
    pub fn with_reducer(config: &CompressorConfig, reducer: Arc<dyn SizeReducer>) -> Self {
        Self {
            transformer: Arc::new(Transformer::new(MappingDefaults::from(config), reducer)),
            dispatcher: WorkerDispatcher::from_config(config),
            max_file_size: config.max_file_size_bytes,
        }
    }

    pub fn dispatcher(&self) -> &WorkerDispatcher {
        &self.dispatcher
    }

    /// Compresses one image.
    ///
    /// Errors carry a human-readable message and are returned to the caller
    /// unchanged; a score that cannot be derived is `None`, not 0.
    pub async fn process_image(
        &self,
        source: &SourceImage,
        settings: &ProcessingSettings,
    ) -> CompressorResult<ProcessedImage> {
        debug!("Processing '{}' ({} bytes, {})", source.name, source.size(), source.mime_type);

        for warning in validate_source(source, self.max_file_size)? {
            warn!("'{}': {}", source.name, warning);
        }
        validate_settings(settings)?;

        let job = WorkerJob::new(source.clone(), settings.clone());
        let dispatched = self.dispatcher.dispatch(job, Arc::clone(&self.transformer)).await?;

        let score = quality_score(source.size(), dispatched.encoded.data.len() as u64);
        let result = ProcessingResult::new(dispatched.encoded, score);
        debug!(
            "'{}' → {} bytes as {} (score {:?}, {:?})",
            source.name, result.size, result.mime_type, result.quality_score, dispatched.path
        );

        Ok(ProcessedImage { result, path: dispatched.path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OutputFormat;
    use crate::utils::{CompressorError, ImageFormat};
    use crate::worker::FallbackReason;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 40]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[tokio::test]
    async fn mime_matches_requested_format_for_every_quality_band() {
        let processor = ImageProcessor::new(&CompressorConfig::default());
        let source = SourceImage::new("g.png", "image/png", png_bytes(40, 30));

        for quality in [1u8, 25, 50, 75, 100] {
            for (output, expected) in [
                (OutputFormat::Original, ImageFormat::PNG),
                (OutputFormat::Jpeg, ImageFormat::JPEG),
                (OutputFormat::Png, ImageFormat::PNG),
                (OutputFormat::Webp, ImageFormat::WebP),
            ] {
                let settings = ProcessingSettings { output_format: output, quality, ..Default::default() };
                let processed = processor.process_image(&source, &settings).await.unwrap();
                assert_eq!(processed.result.format, expected);
                assert_eq!(processed.result.mime_type, expected.mime_type());
                assert_eq!(ImageFormat::from_bytes(&processed.result.data), Some(expected));
            }
        }
    }

    #[tokio::test]
    async fn huge_target_size_fails_the_item_only() {
        let processor = ImageProcessor::new(&CompressorConfig::default());
        let source = SourceImage::new("tiny.png", "image/png", png_bytes(4, 4));

        let settings = ProcessingSettings {
            output_format: OutputFormat::Png,
            width: Some(200_000),
            height: Some(200_000),
            ..Default::default()
        };
        let err = processor.process_image(&source, &settings).await.unwrap_err();
        assert!(matches!(err, CompressorError::Validation(_)));

        // Within the per-side limit, but the kept aspect ratio blows the area up
        let tall = SourceImage::new("tall.png", "image/png", png_bytes(1, 400));
        let settings = ProcessingSettings { output_format: OutputFormat::Png, width: Some(16_000), ..Default::default() };
        let err = processor.process_image(&tall, &settings).await.unwrap_err();
        assert!(matches!(err, CompressorError::Encode(_)));

        let ok = ProcessingSettings { output_format: OutputFormat::Png, ..Default::default() };
        assert!(processor.process_image(&source, &ok).await.is_ok());
    }

    #[tokio::test]
    async fn repeated_runs_produce_equal_sizes() {
        let processor = ImageProcessor::new(&CompressorConfig::default());
        let source = SourceImage::new("g.png", "image/png", png_bytes(40, 30));
        let settings = ProcessingSettings { output_format: OutputFormat::Jpeg, quality: 70, ..Default::default() };

        let first = processor.process_image(&source, &settings).await.unwrap();
        let second = processor.process_image(&source, &settings).await.unwrap();
        assert_eq!(first.result.size, second.result.size);
    }

    #[tokio::test]
    async fn small_sources_run_on_the_caller() {
        let processor = ImageProcessor::new(&CompressorConfig::default());
        let source = SourceImage::new("g.png", "image/png", png_bytes(16, 16));
        let processed = processor.process_image(&source, &ProcessingSettings::default()).await.unwrap();
        assert_eq!(processed.path, ExecutionPath::MainThread(FallbackReason::BelowThreshold));
        assert!(processed.result.quality_score.is_some());
    }

    #[tokio::test]
    async fn non_images_are_rejected_before_dispatch() {
        let processor = ImageProcessor::new(&CompressorConfig::default());
        let source = SourceImage::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = processor.process_image(&source, &ProcessingSettings::default()).await.unwrap_err();
        assert!(matches!(err, CompressorError::Validation(_)));
    }

    #[tokio::test]
    async fn corrupt_images_fail_with_image_load_error() {
        let processor = ImageProcessor::new(&CompressorConfig::default());
        let source = SourceImage::new("bad.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0x00, 0x01]);
        let err = processor.process_image(&source, &ProcessingSettings::default()).await.unwrap_err();
        assert!(err.to_string().starts_with("Image load error"));
    }
}
