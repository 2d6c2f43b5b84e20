use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::{ArchiveCompression, CompressionConfig};
use crate::error::{PackratError, Result};
use crate::retention::ARCHIVE_PREFIX;

/// Archive filename for a build timestamp: `backup_YYYYMMDD-HHMMSS.zip`.
pub fn archive_file_name(at: DateTime<Local>) -> String {
    format!("{ARCHIVE_PREFIX}{}.zip", at.format("%Y%m%d-%H%M%S"))
}

fn file_options(compression: &CompressionConfig) -> SimpleFileOptions {
    // zip64 so archives past the classic 4 GiB limit still build.
    let base = SimpleFileOptions::default().large_file(true);
    match compression.method {
        ArchiveCompression::Zstd => base
            .compression_method(CompressionMethod::Zstd)
            .compression_level(Some(compression.level.into())),
        ArchiveCompression::Deflate => base
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression.level.into())),
        ArchiveCompression::Store => base.compression_method(CompressionMethod::Stored),
    }
}

/// Build one archive of everything under `staging_dir` into `store_dir`.
///
/// Files are stored with paths relative to `staging_dir` so extraction
/// reproduces the original tree. Fail-fast: the first I/O error aborts the
/// build. The zip is assembled in a temp file inside `store_dir` and only
/// persisted under its final name on success, so a failed build never
/// leaves a partial archive in the store.
pub fn build(
    staging_dir: &Path,
    store_dir: &Path,
    compression: &CompressionConfig,
    at: DateTime<Local>,
) -> Result<PathBuf> {
    let archive_err = |message: String| PackratError::Archive(message);

    fs::create_dir_all(store_dir)
        .map_err(|e| archive_err(format!("cannot create store '{}': {e}", store_dir.display())))?;

    let name = archive_file_name(at);
    let dest = store_dir.join(&name);

    let tmp = NamedTempFile::new_in(store_dir)
        .map_err(|e| archive_err(format!("cannot create temp file in store: {e}")))?;
    let mut zip = ZipWriter::new(tmp);
    let options = file_options(compression);

    let mut files = 0usize;
    for entry in WalkDir::new(staging_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| archive_err(format!("walk failed: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(staging_dir)
            .map_err(|e| archive_err(format!("path outside staging root: {e}")))?;
        // `/`-separated key regardless of platform separator.
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(&key, options)
            .map_err(|e| archive_err(format!("cannot add '{key}': {e}")))?;
        let mut file = fs::File::open(entry.path())
            .map_err(|e| archive_err(format!("cannot read '{}': {e}", entry.path().display())))?;
        io::copy(&mut file, &mut zip)
            .map_err(|e| archive_err(format!("cannot compress '{key}': {e}")))?;
        files += 1;
    }

    let tmp = zip
        .finish()
        .map_err(|e| archive_err(format!("cannot finalize archive: {e}")))?;
    tmp.persist(&dest)
        .map_err(|e| archive_err(format!("cannot persist '{}': {}", dest.display(), e.error)))?;

    info!(archive = %dest.display(), files, "archive written");
    Ok(dest)
}
