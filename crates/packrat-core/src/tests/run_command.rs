use std::fs;

use crate::commands::run::run;
use crate::config::EmailConfig;
use crate::error::PackratError;
use crate::notify::EmailNotifier;
use crate::testutil::{
    source, test_config, write_stub_program, FailingNotifier, RecordingNotifier,
    STUB_TRANSFER_SCRIPT,
};

#[test]
fn full_run_archives_stages_and_cleans() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    let program = write_stub_program(tmp.path(), "stub-transfer", STUB_TRANSFER_SCRIPT);

    let mut cfg = test_config(&staging, &store, &program);
    cfg.sources = vec![source("docs"), source("photos")];
    let notifier = RecordingNotifier::new();

    let summary = run(&cfg, &notifier).unwrap();
    assert_eq!(summary.staged_sources, 2);
    assert_eq!(summary.source_failures, 0);
    assert!(summary.archive.exists());
    assert!(
        summary
            .archive
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("backup_")
    );

    // Staging is fully emptied after a successful run.
    assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    // Nothing went wrong, success mail is off by default: no messages.
    assert!(notifier.messages().is_empty());
}

#[test]
fn failing_source_is_notified_but_the_run_still_archives() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    let program = write_stub_program(tmp.path(), "stub-transfer", STUB_TRANSFER_SCRIPT);

    let mut cfg = test_config(&staging, &store, &program);
    cfg.sources = vec![source("docs"), source("bad-share"), source("photos")];
    let notifier = RecordingNotifier::new();

    let summary = run(&cfg, &notifier).unwrap();
    assert_eq!(summary.staged_sources, 2);
    assert_eq!(summary.source_failures, 1);
    assert!(summary.archive.exists());

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("bad-share"));
}

#[test]
fn archive_failure_notifies_once_and_staging_is_still_cleaned() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    // A plain file where the store directory should be makes archiving fail.
    fs::write(&store, b"not a directory").unwrap();
    let program = write_stub_program(tmp.path(), "stub-transfer", STUB_TRANSFER_SCRIPT);

    let cfg = test_config(&staging, &store, &program);
    let notifier = RecordingNotifier::new();

    let err = run(&cfg, &notifier).unwrap_err();
    assert!(matches!(err, PackratError::Archive(_)));

    // Cleaning ran despite the archiving failure.
    assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);

    // Exactly one notification, naming the failing stage.
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("archiving"));
}

#[test]
fn disabled_email_still_aborts_on_fatal_error_without_crashing() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    fs::write(&store, b"not a directory").unwrap();
    let program = write_stub_program(tmp.path(), "stub-transfer", STUB_TRANSFER_SCRIPT);

    let cfg = test_config(&staging, &store, &program);
    let notifier = EmailNotifier::new(EmailConfig::default());

    // The run fails, no message goes out, and nothing panics.
    let err = run(&cfg, &notifier).unwrap_err();
    assert!(matches!(err, PackratError::Archive(_)));
    // No partial archive was written: the store path is untouched.
    assert_eq!(fs::read(&store).unwrap(), b"not a directory");
}

#[test]
fn notifier_failures_are_swallowed() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    let program = write_stub_program(tmp.path(), "stub-transfer", STUB_TRANSFER_SCRIPT);

    let mut cfg = test_config(&staging, &store, &program);
    cfg.sources = vec![source("docs"), source("bad-share")];

    // Delivery always fails; the run must not.
    let summary = run(&cfg, &FailingNotifier).unwrap();
    assert_eq!(summary.source_failures, 1);
    assert!(summary.archive.exists());
}

#[test]
fn success_mail_is_sent_when_enabled() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    let program = write_stub_program(tmp.path(), "stub-transfer", STUB_TRANSFER_SCRIPT);

    let mut cfg = test_config(&staging, &store, &program);
    cfg.email.notify_success = true;
    let notifier = RecordingNotifier::new();

    run(&cfg, &notifier).unwrap();
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Backup run completed"));
}
