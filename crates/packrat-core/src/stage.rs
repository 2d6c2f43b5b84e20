use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::config::{SourceEntry, TransferConfig};
use crate::error::{PackratError, Result};

/// One remote source that could not be retrieved.
#[derive(Debug)]
pub struct SourceFailure {
    pub source: String,
    pub error: PackratError,
}

/// Aggregated outcome of a staging pass over all configured sources.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub fetched: usize,
    pub failures: Vec<SourceFailure>,
}

impl FetchReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Retrieve every configured source into the staging directory.
///
/// Per-source failures are collected and reported, never aborting the pass:
/// a source that cannot be reached still lets the remaining sources stage.
/// Only a staging directory that cannot be created is fatal.
pub fn fetch(
    sources: &[SourceEntry],
    transfer: &TransferConfig,
    staging_dir: &Path,
) -> Result<FetchReport> {
    fs::create_dir_all(staging_dir)?;

    let mut report = FetchReport::default();
    for source in sources {
        match fetch_one(transfer, source, staging_dir) {
            Ok(()) => {
                info!(source = %source.name, "source staged");
                report.fetched += 1;
            }
            Err(e) => {
                warn!(source = %source.name, error = %e, "source retrieval failed, continuing");
                report.failures.push(SourceFailure {
                    source: source.name.clone(),
                    error: e,
                });
            }
        }
    }
    Ok(report)
}

/// Invoke the external transfer tool for a single source with "update, skip
/// existing" semantics. Files already present under the same name are never
/// overwritten.
fn fetch_one(transfer: &TransferConfig, source: &SourceEntry, dest: &Path) -> Result<()> {
    let mut cmd = Command::new(&transfer.program);
    cmd.arg("copy")
        .arg("-v")
        .arg("--update")
        .arg("--ignore-existing");
    if let Some(ref config_file) = transfer.config_file {
        cmd.arg("--config").arg(config_file);
    }
    if source.shared_drive {
        cmd.arg("--drive-shared-with-me");
    }
    for extra in &transfer.extra_args {
        cmd.arg(extra);
    }
    cmd.arg(format!("{}:{}", transfer.remote, source.name));
    cmd.arg(dest);

    let output = cmd.output().map_err(|e| PackratError::Retrieval {
        source_name: source.name.clone(),
        message: format!("failed to launch '{}': {e}", transfer.program),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(PackratError::Retrieval {
            source_name: source.name.clone(),
            message: format!(
                "'{}' exited with {code}: {}",
                transfer.program,
                stderr.trim()
            ),
        });
    }

    Ok(())
}

/// One staging entry that could not be removed.
#[derive(Debug)]
pub struct CleanFailure {
    pub path: String,
    pub message: String,
}

/// Aggregated outcome of emptying the staging directory.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed: usize,
    pub failures: Vec<CleanFailure>,
}

impl CleanReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Empty the staging directory, best-effort per entry.
///
/// An entry that cannot be removed is recorded and the remaining entries are
/// still deleted. A missing staging directory counts as already empty; only
/// an unreadable one is fatal.
pub fn clean(staging_dir: &Path) -> Result<CleanReport> {
    let dir = match fs::read_dir(staging_dir) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CleanReport::default()),
        Err(e) => {
            return Err(PackratError::Cleanup(format!(
                "cannot read staging directory '{}': {e}",
                staging_dir.display()
            )));
        }
    };

    let mut report = CleanReport::default();
    for entry in dir {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                return Err(PackratError::Cleanup(format!(
                    "cannot read staging directory '{}': {e}",
                    staging_dir.display()
                )));
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let result = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove staging entry");
                report.failures.push(CleanFailure {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}
