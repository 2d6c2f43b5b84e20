use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::retention::{self, RotateDecision, StoreEntry};

/// One archive the rotation marked for deletion but could not remove.
#[derive(Debug)]
pub struct DeleteFailure {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RotateStats {
    pub kept: usize,
    pub deleted: usize,
    pub failures: Vec<DeleteFailure>,
}

/// Formatted list entry for --list / --dry-run output.
#[derive(Debug)]
pub struct RotateListEntry {
    pub action: &'static str,
    pub name: String,
    pub bucket: &'static str,
}

/// Read the backup store and parse every entry name.
///
/// Fail-fast: a single malformed name aborts the whole retention run before
/// any deletion happens. A missing store directory is an empty store.
pub fn scan_store(store_dir: &Path) -> Result<Vec<StoreEntry>> {
    let dir = match fs::read_dir(store_dir) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for entry in dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        entries.push(StoreEntry::parse(&name)?);
    }
    Ok(entries)
}

/// Apply the retention policy to the backup store.
///
/// Deletion is continue-on-error: an archive that cannot be removed is
/// recorded in the stats while the remaining marked archives are still
/// deleted.
pub fn run(store_dir: &Path, dry_run: bool) -> Result<(RotateStats, Vec<RotateListEntry>)> {
    let store_entries = scan_store(store_dir)?;
    let plan = retention::plan(&store_entries);

    let mut stats = RotateStats::default();
    let mut list_entries = Vec::with_capacity(plan.entries.len());

    for entry in &plan.entries {
        match entry.decision {
            RotateDecision::Keep => {
                stats.kept += 1;
                list_entries.push(RotateListEntry {
                    action: "keep",
                    name: entry.name.clone(),
                    bucket: entry.bucket.as_str(),
                });
            }
            RotateDecision::Delete => {
                list_entries.push(RotateListEntry {
                    action: "delete",
                    name: entry.name.clone(),
                    bucket: entry.bucket.as_str(),
                });
                if dry_run {
                    stats.deleted += 1;
                    continue;
                }
                match fs::remove_file(store_dir.join(&entry.name)) {
                    Ok(()) => {
                        info!(archive = %entry.name, bucket = %entry.bucket, "deleted superseded archive");
                        stats.deleted += 1;
                    }
                    Err(e) => {
                        warn!(archive = %entry.name, error = %e, "failed to delete archive, continuing");
                        stats.failures.push(DeleteFailure {
                            name: entry.name.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    Ok((stats, list_entries))
}
