//! Source images and the batch queue.

use serde::Serialize;
use crate::core::{ProcessingResult, ProcessingSettings};
use crate::utils::ImageFormat;

const UNKNOWN_MIME: &str = "application/octet-stream";

/// One source image as handed to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// File name, used for logging and output naming
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Builds a source whose MIME type is sniffed from the bytes.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let mime_type = ImageFormat::from_bytes(&data)
            .map(|f| f.mime_type())
            .unwrap_or(UNKNOWN_MIME);
        Self::new(name, mime_type, data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Whether a batch run should pick this item up
    pub fn is_runnable(self) -> bool {
        matches!(self, Self::Pending | Self::Error)
    }
}

/// A queued image and its processing state.
///
/// Transitions go through [`QueueItem::mark_processing`], [`QueueItem::complete`]
/// and [`QueueItem::fail`], which keep exactly one of result/error set once
/// the item resolves.
#[derive(Debug, Clone)]
pub struct QueueItem {
    source: SourceImage,
    status: ItemStatus,
    result: Option<ProcessingResult>,
    error: Option<String>,
    settings: Option<ProcessingSettings>,
}

impl QueueItem {
    pub fn new(source: SourceImage) -> Self {
        Self {
            source,
            status: ItemStatus::Pending,
            result: None,
            error: None,
            settings: None,
        }
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Settings snapshot the item was last processed with
    pub fn settings(&self) -> Option<&ProcessingSettings> {
        self.settings.as_ref()
    }

    pub fn quality_score(&self) -> Option<u8> {
        self.result.as_ref().and_then(|r| r.quality_score)
    }

    pub fn mark_processing(&mut self, settings: ProcessingSettings) {
        self.status = ItemStatus::Processing;
        self.settings = Some(settings);
    }

    pub fn complete(&mut self, result: ProcessingResult) {
        self.status = ItemStatus::Completed;
        self.result = Some(result);
        self.error = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ItemStatus::Error;
        self.result = None;
        self.error = Some(error.into());
    }
}

/// Ordered list of queued images.
#[derive(Debug, Default)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: SourceImage) {
        self.items.push(QueueItem::new(source));
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [QueueItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Drops every item
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<SourceImage> for Queue {
    fn from_iter<T: IntoIterator<Item = SourceImage>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(QueueItem::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EncodedImage;

    fn result() -> ProcessingResult {
        ProcessingResult::new(
            EncodedImage { data: vec![1, 2, 3], format: ImageFormat::PNG, width: 1, height: 1 },
            Some(90),
        )
    }

    #[test]
    fn failing_clears_previous_result() {
        let mut item = QueueItem::new(SourceImage::new("a.png", "image/png", vec![0; 4]));
        item.mark_processing(ProcessingSettings::default());
        item.complete(result());
        assert_eq!(item.quality_score(), Some(90));

        item.fail("Image load error: truncated");
        assert_eq!(item.status(), ItemStatus::Error);
        assert!(item.result().is_none());
        assert_eq!(item.quality_score(), None);
        assert_eq!(item.error(), Some("Image load error: truncated"));
    }

    #[test]
    fn completing_clears_previous_error() {
        let mut item = QueueItem::new(SourceImage::new("a.png", "image/png", vec![0; 4]));
        item.fail("boom");
        item.complete(result());
        assert!(item.error().is_none());
        assert!(item.status().is_terminal());
    }

    #[test]
    fn unknown_bytes_get_a_non_image_mime() {
        let source = SourceImage::from_bytes("notes.txt", b"hello".to_vec());
        assert_eq!(source.mime_type, UNKNOWN_MIME);
    }

    #[test]
    fn reset_empties_the_queue() {
        let mut queue: Queue = vec![
            SourceImage::new("a.png", "image/png", vec![1]),
            SourceImage::new("b.png", "image/png", vec![2]),
        ]
        .into_iter()
        .collect();
        assert_eq!(queue.count(ItemStatus::Pending), 2);
        queue.reset();
        assert!(queue.is_empty());
    }
}
