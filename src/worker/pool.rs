//! Permit-bounded dispatch of transforms onto blocking worker threads.

use std::sync::Arc;
use lazy_static::lazy_static;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::core::{CompressorConfig, EncodedImage};
use crate::processing::Transformer;
use crate::utils::CompressorResult;
use crate::worker::{WorkerError, WorkerJob, WorkerResult};

lazy_static! {
    /// Worker cap for this host, computed once.
    pub static ref DEFAULT_WORKERS: usize =
        default_worker_count(std::thread::available_parallelism().ok().map(|n| n.get()));
}

/// One core is left to the caller; 2 when the host does not report its cores.
pub fn default_worker_count(reported_cores: Option<usize>) -> usize {
    match reported_cores {
        Some(cores) => cores.saturating_sub(1).max(1),
        None => 2,
    }
}

/// Why a job ran on the calling task instead of a background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    /// Source is not big enough to be worth offloading
    BelowThreshold,
    /// Every worker permit is taken
    CapReached,
    /// No runtime to start a worker on
    SpawnUnavailable,
}

/// The path a dispatched job actually took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionPath {
    Background,
    MainThread(FallbackReason),
}

/// Outcome of [`WorkerDispatcher::select_path`].
///
/// A background selection owns its worker permit; dropping the selection
/// returns the permit.
#[derive(Debug)]
pub enum PathSelection {
    Background {
        permit: OwnedSemaphorePermit,
        handle: Handle,
    },
    MainThread(FallbackReason),
}

impl PathSelection {
    pub fn path(&self) -> ExecutionPath {
        match self {
            Self::Background { .. } => ExecutionPath::Background,
            Self::MainThread(reason) => ExecutionPath::MainThread(*reason),
        }
    }
}

/// A finished job and the path it took.
#[derive(Debug)]
pub struct Dispatched {
    pub encoded: EncodedImage,
    pub path: ExecutionPath,
}

/// Decides per job whether to offload it to a blocking worker thread.
///
/// Capacity is a semaphore owned by the dispatcher; each background job
/// holds one permit from selection until its closure returns.
#[derive(Debug, Clone)]
pub struct WorkerDispatcher {
    semaphore: Arc<Semaphore>,
    worker_count: usize,
    threshold_bytes: u64,
}

impl WorkerDispatcher {
    pub fn new(worker_count: Option<usize>, threshold_bytes: u64) -> Self {
        let worker_count = worker_count.unwrap_or(*DEFAULT_WORKERS).max(1);
        debug!("Worker dispatcher: {} workers, offload above {} bytes", worker_count, threshold_bytes);
        Self {
            semaphore: Arc::new(Semaphore::new(worker_count)),
            worker_count,
            threshold_bytes,
        }
    }

    pub fn from_config(config: &CompressorConfig) -> Self {
        Self::new(config.max_workers, config.worker_threshold_bytes)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Background jobs currently holding a permit
    pub fn active_workers(&self) -> usize {
        self.worker_count - self.semaphore.available_permits()
    }

    /// Picks the execution path for a source of `source_size` bytes.
    pub fn select_path(&self, source_size: u64) -> PathSelection {
        if source_size <= self.threshold_bytes {
            return PathSelection::MainThread(FallbackReason::BelowThreshold);
        }

        let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
            debug!("No worker available ({}/{} busy), running on the caller", self.active_workers(), self.worker_count);
            return PathSelection::MainThread(FallbackReason::CapReached);
        };

        match spawn_handle() {
            Ok(handle) => PathSelection::Background { permit, handle },
            Err(e) => {
                warn!("{}, running on the caller", e);
                PathSelection::MainThread(FallbackReason::SpawnUnavailable)
            }
        }
    }

    /// Runs `job` on the selected path.
    ///
    /// A failure inside a background job is returned as is; only the
    /// selection step falls back to the calling task.
    pub async fn dispatch(&self, job: WorkerJob, transformer: Arc<Transformer>) -> CompressorResult<Dispatched> {
        match self.select_path(job.size()) {
            PathSelection::Background { permit, handle } => {
                debug!(
                    "Worker started - Active: {}/{}, Task: {}",
                    self.active_workers(), self.worker_count, job.source.name
                );

                let joined = handle
                    .spawn_blocking(move || {
                        let _permit = permit;
                        job.run(&transformer)
                    })
                    .await;
                let encoded = joined.map_err(WorkerError::from)??;

                debug!("Worker finished - Active: {}/{}", self.active_workers(), self.worker_count);
                Ok(Dispatched { encoded, path: ExecutionPath::Background })
            }
            PathSelection::MainThread(reason) => {
                let encoded = job.run(&transformer)?;
                Ok(Dispatched { encoded, path: ExecutionPath::MainThread(reason) })
            }
        }
    }
}

fn spawn_handle() -> WorkerResult<Handle> {
    Ok(Handle::try_current()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OutputFormat, ProcessingSettings, SourceImage};
    use crate::utils::CompressorError;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_source(name: &str) -> SourceImage {
        let img = RgbImage::from_fn(48, 32, |x, y| Rgb([x as u8 * 5, y as u8 * 7, 90]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        SourceImage::new(name, "image/png", cursor.into_inner())
    }

    fn webp_job(source: SourceImage) -> WorkerJob {
        WorkerJob::new(
            source,
            ProcessingSettings { output_format: OutputFormat::Webp, quality: 60, ..Default::default() },
        )
    }

    #[test]
    fn worker_count_from_cores() {
        assert_eq!(default_worker_count(Some(8)), 7);
        assert_eq!(default_worker_count(Some(2)), 1);
        assert_eq!(default_worker_count(Some(1)), 1);
        assert_eq!(default_worker_count(None), 2);
    }

    #[test]
    fn small_sources_stay_on_the_caller() {
        let dispatcher = WorkerDispatcher::new(Some(2), 1024);
        let selection = dispatcher.select_path(1024);
        assert_eq!(selection.path(), ExecutionPath::MainThread(FallbackReason::BelowThreshold));
        assert_eq!(dispatcher.active_workers(), 0);
    }

    #[test]
    fn no_runtime_falls_back_and_returns_the_permit() {
        let dispatcher = WorkerDispatcher::new(Some(1), 0);
        let selection = dispatcher.select_path(10);
        assert_eq!(selection.path(), ExecutionPath::MainThread(FallbackReason::SpawnUnavailable));
        assert_eq!(dispatcher.active_workers(), 0);
    }

    #[tokio::test]
    async fn dropping_a_selection_releases_its_permit() {
        let dispatcher = WorkerDispatcher::new(Some(1), 0);
        let selection = dispatcher.select_path(10);
        assert_eq!(selection.path(), ExecutionPath::Background);
        assert_eq!(dispatcher.active_workers(), 1);
        drop(selection);
        assert_eq!(dispatcher.active_workers(), 0);
    }

    #[tokio::test]
    async fn cap_reached_runs_on_caller_with_same_result_shape() {
        let dispatcher = WorkerDispatcher::new(Some(1), 0);
        let transformer = Arc::new(Transformer::default());

        let background = dispatcher
            .dispatch(webp_job(png_source("a.png")), Arc::clone(&transformer))
            .await
            .unwrap();
        assert_eq!(background.path, ExecutionPath::Background);

        let held = dispatcher.select_path(10);
        assert_eq!(held.path(), ExecutionPath::Background);
        let fallback = dispatcher
            .dispatch(webp_job(png_source("a.png")), Arc::clone(&transformer))
            .await
            .unwrap();
        assert_eq!(fallback.path, ExecutionPath::MainThread(FallbackReason::CapReached));

        assert_eq!(fallback.encoded.format, background.encoded.format);
        assert_eq!(
            (fallback.encoded.width, fallback.encoded.height),
            (background.encoded.width, background.encoded.height)
        );
        assert_eq!(fallback.encoded.data.len(), background.encoded.data.len());
        drop(held);
        assert_eq!(dispatcher.active_workers(), 0);
    }

    #[tokio::test]
    async fn background_errors_surface_and_release_the_permit() {
        let dispatcher = WorkerDispatcher::new(Some(1), 0);
        let corrupt = SourceImage::new("broken.png", "image/png", b"\x89PNG\r\n\x1a\nnope".to_vec());

        let err = dispatcher
            .dispatch(webp_job(corrupt), Arc::new(Transformer::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, CompressorError::Decode(_)));
        assert_eq!(dispatcher.active_workers(), 0);
    }
}
