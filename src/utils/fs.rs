use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};
use crate::core::SourceImage;
use crate::utils::{CompressorError, CompressorResult, ImageFormat, format_from_extension};

/// Reads an image file into a [`SourceImage`].
///
/// The MIME type follows a recognised file extension, so a damaged `.jpg`
/// still reaches the decoder; other files have it sniffed from their bytes.
pub async fn read_source(path: impl AsRef<Path>) -> CompressorResult<SourceImage> {
    let path = path.as_ref();
    let data = fs::read(path)
        .await
        .map_err(|e| CompressorError::IO(format!("Failed to read {}: {}", path.display(), e)))?;

    let name = extract_filename(path);
    Ok(match format_from_extension(&name) {
        Ok(format) => SourceImage::new(name, format.mime_type(), data),
        Err(_) => SourceImage::from_bytes(name, data),
    })
}

/// File name component of `path`, or the whole path if there is none
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Download name for a compressed file: `photo.png` → `photo-compressed.webp`.
///
/// The extension follows the encoding actually produced.
pub fn compressed_file_name(original_name: &str, format: ImageFormat) -> String {
    let stem = match original_name.rfind('.') {
        Some(idx) if idx > 0 => &original_name[..idx],
        _ => original_name,
    };
    format!("{}-compressed.{}", stem, format.primary_extension())
}

/// Returns `name`, or `stem-N.ext` with the lowest free `N`, and marks the
/// result as taken.
///
/// Names are compared case-insensitively so outputs stay distinct on
/// case-folding file systems.
pub fn claim_unique_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_lowercase()) {
        return name;
    }

    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name.as_str(), ""),
    };
    let mut n = 1u32;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if taken.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

/// Writes `data` under `dir`, creating the directory when needed.
pub async fn write_output(dir: &Path, file_name: &str, data: &[u8]) -> CompressorResult<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    fs::write(&path, data).await?;
    debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(path)
}

/// Writes `entries` as `(file name, bytes)` into a new ZIP archive at `path`.
///
/// Parent directories are created; an existing archive is replaced.
pub async fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) -> CompressorResult<()> {
    let zip_err = |e: zip::result::ZipError| CompressorError::IO(format!("Failed to build {}: {}", path.display(), e));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(name.as_str(), options).map_err(zip_err)?;
        writer.write_all(data)?;
    }
    let archive = writer.finish().map_err(zip_err)?.into_inner();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, &archive).await?;
    debug!("Wrote {} entries ({} bytes) to {}", entries.len(), archive.len(), path.display());
    Ok(())
}

/// Milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Expands files and directories into a deduplicated list of image files.
///
/// Directories are walked recursively; files are kept in argument order.
pub fn expand_inputs(inputs: &[PathBuf]) -> CompressorResult<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            collect_images(input, &mut seen, &mut files)?;
        } else if input.is_file() {
            if seen.insert(input.canonicalize()?) {
                files.push(input.clone());
            }
        } else {
            return Err(CompressorError::IO(format!(
                "Not a file or directory: {}", input.display()
            )));
        }
    }

    Ok(files)
}

fn collect_images(dir: &Path, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) -> CompressorResult<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_images(&path, seen, files)?;
        } else if format_from_extension(&path.to_string_lossy()).is_ok()
            && seen.insert(path.canonicalize()?)
        {
            files.push(path);
        }
    }
    Ok(())
}
