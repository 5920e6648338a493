use crate::core::{EncodedImage, ProcessingSettings, SourceImage};
use crate::processing::Transformer;
use crate::utils::CompressorResult;

/// Everything a worker needs for one image.
///
/// Workers own their copy of the source and settings; nothing is shared
/// with the caller while the job runs.
#[derive(Debug, Clone)]
pub struct WorkerJob {
    pub source: SourceImage,
    pub settings: ProcessingSettings,
}

impl WorkerJob {
    pub fn new(source: SourceImage, settings: ProcessingSettings) -> Self {
        Self { source, settings }
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub fn run(&self, transformer: &Transformer) -> CompressorResult<EncodedImage> {
        transformer.transform(&self.source, &self.settings)
    }
}
