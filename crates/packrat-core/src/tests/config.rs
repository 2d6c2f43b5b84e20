use std::path::PathBuf;

use crate::config::{self, ArchiveCompression};
use crate::error::PackratError;

fn write_config(dir: &tempfile::TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("packrat.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn loads_a_full_document() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        r#"
staging_dir: /tmp/staging
store_dir: /tmp/store
sources:
  - DriveSyncFiles
  - name: team-drive
    shared_drive: true
transfer:
  program: rclone
  remote: gdrive
  config_file: rclone.conf
compression:
  method: deflate
  level: 6
email:
  enabled: true
  username: sender@example.com
  password: hunter2
  recipient: ops@example.com
"#,
    );

    let cfg = config::load(&path).unwrap();
    assert_eq!(cfg.staging_dir, "/tmp/staging");
    assert_eq!(cfg.store_dir, "/tmp/store");
    assert_eq!(cfg.sources.len(), 2);
    assert_eq!(cfg.sources[0].name, "DriveSyncFiles");
    assert!(!cfg.sources[0].shared_drive);
    assert_eq!(cfg.sources[1].name, "team-drive");
    assert!(cfg.sources[1].shared_drive);
    assert_eq!(cfg.transfer.remote, "gdrive");
    assert_eq!(cfg.compression.method, ArchiveCompression::Deflate);
    assert_eq!(cfg.compression.level, 6);
    assert!(cfg.email.enabled);
    assert_eq!(cfg.email.recipient, "ops@example.com");
}

#[test]
fn comma_separated_simple_sources_are_split() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: /tmp/a\nstore_dir: /tmp/b\nsources:\n  - \"docs, photos ,music\"\n",
    );
    let cfg = config::load(&path).unwrap();
    let names: Vec<&str> = cfg.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["docs", "photos", "music"]);
}

#[test]
fn env_placeholders_are_expanded() {
    let tmp = tempfile::tempdir().unwrap();
    unsafe {
        std::env::set_var("PACKRAT_TEST_SOURCES", "alpha,beta");
    }
    let path = write_config(
        &tmp,
        "staging_dir: /tmp/a\nstore_dir: /tmp/b\nsources:\n  - \"${PACKRAT_TEST_SOURCES}\"\n",
    );
    let cfg = config::load(&path).unwrap();
    let names: Vec<&str> = cfg.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn env_placeholder_defaults_apply_when_unset() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: \"${PACKRAT_TEST_UNSET_DIR:-/tmp/fallback}\"\nstore_dir: /tmp/b\nsources:\n  - docs\n",
    );
    let cfg = config::load(&path).unwrap();
    assert_eq!(cfg.staging_dir, "/tmp/fallback");
}

#[test]
fn missing_env_variable_is_a_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: \"${PACKRAT_TEST_DEFINITELY_MISSING}\"\nstore_dir: /tmp/b\nsources:\n  - docs\n",
    );
    let err = config::load(&path).unwrap_err();
    assert!(matches!(err, PackratError::Config(_)));
    assert!(err.to_string().contains("PACKRAT_TEST_DEFINITELY_MISSING"));
}

#[test]
fn empty_sources_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(&tmp, "staging_dir: /tmp/a\nstore_dir: /tmp/b\n");
    assert!(config::load(&path).is_err());
}

#[test]
fn duplicate_source_names_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: /tmp/a\nstore_dir: /tmp/b\nsources:\n  - docs\n  - docs\n",
    );
    let err = config::load(&path).unwrap_err();
    assert!(err.to_string().contains("duplicate source name"));
}

#[test]
fn enabled_email_requires_credentials_and_recipient() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: /tmp/a\nstore_dir: /tmp/b\nsources:\n  - docs\nemail:\n  enabled: true\n",
    );
    let err = config::load(&path).unwrap_err();
    assert!(matches!(err, PackratError::Config(_)));
}

#[test]
fn unknown_fields_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: /tmp/a\nstore_dir: /tmp/b\nsources:\n  - docs\nretention_mode: aggressive\n",
    );
    assert!(config::load(&path).is_err());
}

#[test]
fn out_of_range_compression_level_is_clamped() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        &tmp,
        "staging_dir: /tmp/a\nstore_dir: /tmp/b\nsources:\n  - docs\ncompression:\n  method: deflate\n  level: 42\n",
    );
    let cfg = config::load(&path).unwrap();
    assert_eq!(cfg.compression.level, 9);
}

#[test]
fn template_parses_back_into_a_valid_config() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(&tmp, config::minimal_config_template());
    let cfg = config::load(&path).unwrap();
    assert_eq!(cfg.sources.len(), 1);
    assert_eq!(cfg.sources[0].name, "DriveSyncFiles");
    assert!(!cfg.email.enabled);
}
