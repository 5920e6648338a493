mod processor;

pub use processor::{BatchObserver, BatchOutcome, BatchProcessor, NoopObserver};
