#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker could not be started: {0}")]
    SpawnUnavailable(String),

    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("Worker was cancelled: {0}")]
    Cancelled(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            WorkerError::Panicked(err.to_string())
        } else {
            WorkerError::Cancelled(err.to_string())
        }
    }
}

impl From<tokio::runtime::TryCurrentError> for WorkerError {
    fn from(err: tokio::runtime::TryCurrentError) -> Self {
        WorkerError::SpawnUnavailable(err.to_string())
    }
}
