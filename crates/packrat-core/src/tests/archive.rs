use std::fs;
use std::io::Read;

use chrono::{Local, TimeZone};

use crate::archive::{archive_file_name, build};
use crate::config::{ArchiveCompression, CompressionConfig};
use crate::error::PackratError;
use crate::retention::parse_archive_date;

fn build_time() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 7, 14, 30, 5).unwrap()
}

#[test]
fn archive_name_follows_the_store_contract() {
    let name = archive_file_name(build_time());
    assert_eq!(name, "backup_20240307-143005.zip");
    // The retention parser accepts what the builder produces.
    assert!(parse_archive_date(&name).is_ok());
}

#[test]
fn build_stores_paths_relative_to_the_staging_root() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    fs::create_dir_all(staging.join("sub/deeper")).unwrap();
    fs::write(staging.join("top.txt"), b"top level").unwrap();
    fs::write(staging.join("sub/mid.txt"), b"mid level").unwrap();
    fs::write(staging.join("sub/deeper/leaf.txt"), b"leaf").unwrap();

    let path = build(&staging, &store, &CompressionConfig::default(), build_time()).unwrap();
    assert_eq!(path, store.join("backup_20240307-143005.zip"));

    let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(archive.len(), 3);

    let mut contents = String::new();
    archive
        .by_name("sub/deeper/leaf.txt")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "leaf");
}

#[test]
fn empty_staging_still_produces_an_archive() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    fs::create_dir_all(&staging).unwrap();

    let path = build(&staging, &store, &CompressionConfig::default(), build_time()).unwrap();
    let archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(archive.len(), 0);
}

#[test]
fn deflate_method_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("staging");
    let store = tmp.path().join("store");
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("file.txt"), b"deflated bytes").unwrap();

    let compression = CompressionConfig {
        method: ArchiveCompression::Deflate,
        level: 9,
    };
    let path = build(&staging, &store, &compression, build_time()).unwrap();

    let mut archive = zip::ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    let mut contents = String::new();
    archive
        .by_name("file.txt")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "deflated bytes");
}

#[test]
fn failed_build_leaves_no_partial_archive_in_the_store() {
    let tmp = tempfile::tempdir().unwrap();
    let staging = tmp.path().join("missing_staging");
    let store = tmp.path().join("store");

    let err = build(&staging, &store, &CompressionConfig::default(), build_time()).unwrap_err();
    assert!(matches!(err, PackratError::Archive(_)));

    // Only the temp file could have been left behind; it is cleaned up.
    let leftovers: Vec<_> = fs::read_dir(&store).unwrap().collect();
    assert!(leftovers.is_empty());
}
