mod pool;
mod task;
mod error;

pub use pool::{
    default_worker_count,
    Dispatched,
    ExecutionPath,
    FallbackReason,
    PathSelection,
    WorkerDispatcher,
    DEFAULT_WORKERS,
};
pub use task::WorkerJob;
pub use error::{WorkerError, WorkerResult};
