use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, warn};

use crate::archive;
use crate::commands::rotate::{self, RotateStats};
use crate::config::PackratConfig;
use crate::error::{PackratError, Result};
use crate::notify::Notifier;
use crate::stage::{self, CleanReport, FetchReport};

/// Working states of one orchestration run. A failure in any of them moves
/// the run to its failed terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Staging,
    Archiving,
    Cleaning,
    Rotating,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Staging => "staging",
            Stage::Archiving => "archiving",
            Stage::Cleaning => "cleaning",
            Stage::Rotating => "rotating",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub archive: PathBuf,
    pub staged_sources: usize,
    pub source_failures: usize,
    pub cleanup_failures: usize,
    pub rotate: RotateStats,
}

/// Execute one full backup run: stage, archive, clean staging, rotate.
///
/// Stages progress linearly; a fatal component failure triggers exactly one
/// notification naming the failing stage and terminates the run. Cleaning
/// always executes, whether or not archiving succeeded. Per-item failures
/// inside a stage (one source, one staging entry, one deletion) are
/// aggregated, notified, and do not stop the run.
pub fn run(config: &PackratConfig, notifier: &dyn Notifier) -> Result<RunSummary> {
    let staging_dir = Path::new(&config.staging_dir);
    let store_dir = Path::new(&config.store_dir);

    // Staging
    info!(stage = %Stage::Staging, "starting");
    let fetch_report = match stage::fetch(&config.sources, &config.transfer, staging_dir) {
        Ok(report) => report,
        Err(e) => return fail(notifier, Stage::Staging, e),
    };
    if !fetch_report.all_ok() {
        report(notifier, &fetch_failure_body(&fetch_report));
    }

    // Archiving — cleaning always follows, even when this fails.
    info!(stage = %Stage::Archiving, "starting");
    let archive_result = archive::build(staging_dir, store_dir, &config.compression, Local::now());

    // Cleaning
    info!(stage = %Stage::Cleaning, "starting");
    let clean_result = stage::clean(staging_dir);

    let archive_path = match archive_result {
        Ok(path) => path,
        Err(e) => return fail(notifier, Stage::Archiving, e),
    };
    let clean_report = match clean_result {
        Ok(report) => report,
        Err(e) => return fail(notifier, Stage::Cleaning, e),
    };
    if !clean_report.all_ok() {
        report(notifier, &clean_failure_body(&clean_report));
    }

    // Rotating
    info!(stage = %Stage::Rotating, "starting");
    let (rotate_stats, _) = match rotate::run(store_dir, false) {
        Ok(result) => result,
        Err(e) => return fail(notifier, Stage::Rotating, e),
    };
    if !rotate_stats.failures.is_empty() {
        report(notifier, &rotate_failure_body(&rotate_stats));
    }

    let summary = RunSummary {
        archive: archive_path,
        staged_sources: fetch_report.fetched,
        source_failures: fetch_report.failures.len(),
        cleanup_failures: clean_report.failures.len(),
        rotate: rotate_stats,
    };

    if config.email.notify_success {
        report(notifier, &success_body(&summary));
    }

    info!(
        archive = %summary.archive.display(),
        kept = summary.rotate.kept,
        deleted = summary.rotate.deleted,
        "backup run complete"
    );
    Ok(summary)
}

/// Terminal failure path: exactly one notification naming the failing stage,
/// then the run ends. Nothing is persisted between runs.
fn fail<T>(notifier: &dyn Notifier, stage: Stage, err: PackratError) -> Result<T> {
    error!(stage = %stage, error = %err, "backup run failed");
    report(notifier, &format!("Backup run failed during {stage}: {err}"));
    Err(err)
}

/// Deliver a status message. Delivery failures are logged and never
/// escalated, so a broken mail setup cannot cascade.
fn report(notifier: &dyn Notifier, body: &str) {
    if let Err(e) = notifier.notify(body) {
        warn!(error = %e, "status notification could not be delivered");
    }
}

fn fetch_failure_body(fetch: &FetchReport) -> String {
    let mut body = format!(
        "Backup staging finished with {} of {} sources failing:\n",
        fetch.failures.len(),
        fetch.fetched + fetch.failures.len()
    );
    for failure in &fetch.failures {
        body.push_str(&format!("  - {}\n", failure.error));
    }
    body
}

fn clean_failure_body(clean: &CleanReport) -> String {
    let mut body = format!(
        "Staging cleanup could not remove {} entries:\n",
        clean.failures.len()
    );
    for failure in &clean.failures {
        body.push_str(&format!("  - {}: {}\n", failure.path, failure.message));
    }
    body
}

fn rotate_failure_body(stats: &RotateStats) -> String {
    let mut body = format!(
        "Retention rotation could not delete {} archives:\n",
        stats.failures.len()
    );
    for failure in &stats.failures {
        body.push_str(&format!("  - {}: {}\n", failure.name, failure.message));
    }
    body
}

fn success_body(summary: &RunSummary) -> String {
    format!(
        "Backup run completed: wrote '{}' from {} staged sources; retention kept {} and deleted {} archives.",
        summary.archive.display(),
        summary.staged_sources,
        summary.rotate.kept,
        summary.rotate.deleted
    )
}
