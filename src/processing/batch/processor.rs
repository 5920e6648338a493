use std::sync::atomic::{AtomicBool, Ordering};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{ProcessingResult, ProcessingSettings, Progress, ProgressType, Queue, QueueItem};
use crate::processing::ImageProcessor;
use crate::utils::{timestamp_ms, CompressorError, CompressorResult};

/// Receives per-item and aggregate updates while a batch runs.
pub trait BatchObserver: Send + Sync {
    /// Called whenever an item changes status
    fn on_item(&self, _item: &QueueItem) {}

    fn on_progress(&self, _progress: &Progress) {}
}

/// Observer that ignores every update.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// One successfully processed item of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub original_name: String,
    pub original_size: u64,
    pub original_mime: String,
    pub result: ProcessingResult,
    /// Settings snapshot the item was processed with
    pub settings: ProcessingSettings,
    /// Completion time, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

/// Runs a queue through the pipeline one item at a time.
pub struct BatchProcessor {
    processor: ImageProcessor,
    is_processing: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BatchProcessor {
    pub fn new(processor: ImageProcessor) -> Self {
        Self {
            processor,
            is_processing: AtomicBool::new(false),
        }
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Acquire)
    }

    /// Processes every pending or failed item of `queue` in insertion order.
    ///
    /// A failing item is marked as such and the run moves on. Only one run
    /// may be in flight per processor; a second call gets
    /// [`CompressorError::Busy`].
    pub async fn process_all(
        &self,
        queue: &mut Queue,
        settings: &ProcessingSettings,
        observer: &dyn BatchObserver,
    ) -> CompressorResult<Vec<BatchOutcome>> {
        if self
            .is_processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Batch requested while another one is running");
            return Err(CompressorError::Busy);
        }
        let _guard = RunGuard(&self.is_processing);

        let runnable: Vec<usize> = queue
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.status().is_runnable())
            .map(|(index, _)| index)
            .collect();
        let total = runnable.len();

        info!("Processing batch of {} images", total);
        observer.on_progress(&Progress::new(ProgressType::Start, 0, total, "Starting compression"));

        let mut outcomes = Vec::with_capacity(total);
        let mut failed = 0usize;

        for (done, index) in runnable.into_iter().enumerate() {
            let item = &mut queue.items_mut()[index];
            let snapshot = settings.clone();
            item.mark_processing(snapshot.clone());
            observer.on_item(item);

            match self.processor.process_image(item.source(), &snapshot).await {
                Ok(processed) => {
                    let source = item.source();
                    outcomes.push(BatchOutcome {
                        original_name: source.name.clone(),
                        original_size: source.size(),
                        original_mime: source.mime_type.clone(),
                        result: processed.result.clone(),
                        settings: snapshot,
                        timestamp_ms: timestamp_ms(),
                    });
                    item.complete(processed.result);
                }
                Err(e) => {
                    warn!("Failed to process '{}': {}", item.name(), e);
                    failed += 1;
                    item.fail(e.to_string());
                }
            }
            observer.on_item(item);

            let completed = done + 1;
            let progress_type = if completed == total { ProgressType::Complete } else { ProgressType::Progress };
            let status = format!("Processed {completed} of {total}");
            let progress = Progress::new(progress_type, completed, total, &status)
                .with_item(item.name(), item.error());
            debug!("{} ({}%)", progress.status, progress.progress_percentage);
            observer.on_progress(&progress);
        }

        if failed > 0 {
            warn!("Batch finished with {} failed images out of {}", failed, total);
        } else {
            info!("Batch finished: {} images processed", total);
        }

        Ok(outcomes)
    }
}
