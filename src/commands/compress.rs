//! Command handlers for compressing images on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{AppState, ItemStatus, ProcessingSettings, Queue, SourceImage};
use crate::processing::{BatchObserver, ProcessedImage};
use crate::storage::HistoryEntry;
use crate::utils::{
    claim_unique_name,
    compressed_file_name,
    expand_inputs,
    extract_filename,
    read_source,
    write_output,
    write_zip,
    CompressorResult,
};

/// Where [`compress_images`] puts its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// One file per result inside this directory
    Directory(PathBuf),
    /// Every result as an entry of this ZIP archive
    Archive(PathBuf),
}

impl OutputTarget {
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(path) | Self::Archive(path) => path,
        }
    }
}

/// One file written by [`compress_images`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenFile {
    pub source_name: String,
    /// Output file name, unique within the run
    pub file_name: String,
    /// The written file, or the archive holding it
    pub path: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
    pub quality_score: Option<u8>,
}

/// Summary of a [`compress_images`] run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressReport {
    pub written: Vec<WrittenFile>,
    /// `(file name, error message)` for every file that could not be compressed
    pub failed: Vec<(String, String)>,
}

impl CompressReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Compresses a single file in memory.
///
/// Nothing is written; the caller gets the encoded bytes in the result.
pub async fn compress_image(
    state: &AppState,
    input: &Path,
    settings: &ProcessingSettings,
) -> CompressorResult<ProcessedImage> {
    let source = read_source(input).await?;
    state.processor().process_image(&source, settings).await
}

/// Compresses every image under `inputs` and writes the results to `target`.
///
/// Directories are expanded to the image files they contain. Unreadable
/// or undecodable files are reported in [`CompressReport::failed`] and do
/// not stop the run. Output names are made unique within the run, so two
/// sources that map to the same name both survive. On completion the
/// settings are remembered and every success is appended to the history.
pub async fn compress_images(
    state: &AppState,
    inputs: &[PathBuf],
    target: &OutputTarget,
    settings: &ProcessingSettings,
    observer: &dyn BatchObserver,
) -> CompressorResult<CompressReport> {
    let files = expand_inputs(inputs)?;
    debug!("Received compress command for {} files", files.len());

    let mut report = CompressReport::default();
    let mut sources: Vec<SourceImage> = Vec::with_capacity(files.len());
    for file in &files {
        match read_source(file).await {
            Ok(source) => sources.push(source),
            Err(e) => {
                warn!("Skipping {}: {}", file.display(), e);
                report.failed.push((extract_filename(file), e.to_string()));
            }
        }
    }

    let mut queue: Queue = sources.into_iter().collect();
    let outcomes = state.batch().process_all(&mut queue, settings, observer).await?;

    let mut taken = HashSet::new();
    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
    let mut pending: Vec<WrittenFile> = Vec::new();

    for item in queue.items() {
        let (ItemStatus::Completed, Some(result)) = (item.status(), item.result()) else {
            report.failed.push((
                item.name().to_string(),
                item.error().unwrap_or("Not processed").to_string(),
            ));
            continue;
        };

        let file_name = claim_unique_name(compressed_file_name(item.name(), result.format), &mut taken);
        let written = WrittenFile {
            source_name: item.name().to_string(),
            file_name: file_name.clone(),
            path: target.path().to_path_buf(),
            original_size: item.source().size(),
            compressed_size: result.size,
            quality_score: result.quality_score,
        };

        match target {
            OutputTarget::Directory(dir) => match write_output(dir, &file_name, &result.data).await {
                Ok(path) => report.written.push(WrittenFile { path, ..written }),
                Err(e) => {
                    warn!("Failed to write {}: {}", file_name, e);
                    report.failed.push((written.source_name, e.to_string()));
                }
            },
            OutputTarget::Archive(_) => {
                entries.push((file_name, result.data.clone()));
                pending.push(written);
            }
        }
    }

    if let OutputTarget::Archive(path) = target {
        if !pending.is_empty() {
            match write_zip(path, &entries).await {
                Ok(()) => report.written.append(&mut pending),
                Err(e) => {
                    warn!("Failed to write {}: {}", path.display(), e);
                    report.failed.extend(pending.into_iter().map(|w| (w.source_name, e.to_string())));
                }
            }
        }
    }

    let store = state.store();
    store.save_settings(settings);
    store.append_history(outcomes.iter().map(HistoryEntry::from));

    info!(
        "Compressed {}/{} files into {}",
        report.written.len(), report.total(), target.path().display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompressorConfig, OutputFormat};
    use crate::processing::NoopObserver;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> AppState {
        AppState::new(CompressorConfig {
            store_dir: Some(dir.path().join("store")),
            ..Default::default()
        })
    }

    fn write_png(path: &Path) {
        RgbImage::from_fn(30, 20, |x, y| Rgb([x as u8 * 8, y as u8 * 12, 200]))
            .save(path)
            .unwrap();
    }

    #[tokio::test]
    async fn writes_outputs_and_records_history() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write_png(&input.join("a.png"));
        write_png(&input.join("b.png"));
        std::fs::write(input.join("c.jpg"), b"definitely not a jpeg").unwrap();

        let state = state(&dir);
        let settings = ProcessingSettings { output_format: OutputFormat::Webp, quality: 60, ..Default::default() };
        let out = dir.path().join("out");

        let target = OutputTarget::Directory(out.clone());
        let report = compress_images(&state, &[input], &target, &settings, &NoopObserver).await.unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "c.jpg");
        // A damaged .jpg is still handed to the decoder
        assert!(report.failed[0].1.starts_with("Image load error"), "{}", report.failed[0].1);
        assert!(out.join("a-compressed.webp").is_file());
        assert!(out.join("b-compressed.webp").is_file());

        assert_eq!(state.store().load_settings(), Some(settings));
        let history = state.store().load_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].compressed_file_type.as_deref(), Some("image/webp"));
    }

    #[tokio::test]
    async fn same_named_sources_get_distinct_outputs() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(input.join("nested")).unwrap();
        write_png(&input.join("a.png"));
        RgbImage::from_fn(50, 10, |x, _| Rgb([x as u8 * 5, 0, 0]))
            .save(input.join("nested/a.png"))
            .unwrap();
        RgbImage::from_pixel(12, 12, Rgb([9, 9, 9])).save(input.join("a.bmp")).unwrap();

        let state = state(&dir);
        let settings = ProcessingSettings { output_format: OutputFormat::Webp, ..Default::default() };
        let out = dir.path().join("out");
        let target = OutputTarget::Directory(out.clone());
        let report = compress_images(&state, &[input], &target, &settings, &NoopObserver).await.unwrap();

        assert_eq!(report.written.len(), 3);
        assert!(report.failed.is_empty());
        let mut on_disk: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        on_disk.sort();
        assert_eq!(on_disk, ["a-compressed-1.webp", "a-compressed-2.webp", "a-compressed.webp"]);
        for file in &report.written {
            assert_eq!(file.path, out.join(&file.file_name));
        }
    }

    #[tokio::test]
    async fn archive_target_bundles_every_result() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write_png(&input.join("a.png"));
        write_png(&input.join("b.png"));
        std::fs::write(input.join("c.jpg"), b"definitely not a jpeg").unwrap();

        let state = state(&dir);
        let archive = dir.path().join("results.zip");
        let target = OutputTarget::Archive(archive.clone());
        let settings = ProcessingSettings { output_format: OutputFormat::Jpeg, ..Default::default() };
        let report = compress_images(&state, &[input], &target, &settings, &NoopObserver).await.unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.written.iter().all(|w| w.path == archive));

        let mut bundle = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<&str> = bundle.file_names().collect();
        names.sort();
        assert_eq!(names, ["a-compressed.jpg", "b-compressed.jpg"]);
        let mut entry = bundle.by_name("a-compressed.jpg").unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
        assert_eq!(crate::utils::ImageFormat::from_bytes(&bytes), Some(crate::utils::ImageFormat::JPEG));
    }

    #[tokio::test]
    async fn single_image_stays_in_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.png");
        write_png(&path);

        let processed = compress_image(&state(&dir), &path, &ProcessingSettings::default()).await.unwrap();
        assert_eq!(processed.result.mime_type, "image/png");
        assert!(!processed.result.data.is_empty());
    }
}
