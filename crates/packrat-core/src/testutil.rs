use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::{
    CompressionConfig, EmailConfig, PackratConfig, SourceEntry, TransferConfig,
};
use crate::error::{PackratError, Result};
use crate::notify::Notifier;

/// Notifier that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, body: &str) -> Result<()> {
        self.messages.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

/// Notifier whose deliveries always fail.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _body: &str) -> Result<()> {
        Err(PackratError::Delivery("forced delivery failure".into()))
    }
}

/// Write an executable stub transfer program and return its path.
pub fn write_stub_program(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Stub transfer tool: drops one `<source>.txt` file into the destination,
/// failing for any source whose name contains "bad". Mirrors the real
/// invocation shape (`<program> copy ... <remote>:<source> <dest>`).
pub const STUB_TRANSFER_SCRIPT: &str = r#"#!/bin/sh
spec=""
dest=""
for arg in "$@"; do
  spec="$dest"
  dest="$arg"
done
case "$spec" in
  *bad*) echo "remote not reachable" >&2; exit 3 ;;
esac
mkdir -p "$dest"
name="${spec#*:}"
printf 'payload for %s\n' "$name" > "$dest/$name.txt"
"#;

pub fn source(name: &str) -> SourceEntry {
    SourceEntry {
        name: name.to_string(),
        shared_drive: false,
    }
}

pub fn test_config(staging_dir: &Path, store_dir: &Path, program: &Path) -> PackratConfig {
    PackratConfig {
        staging_dir: staging_dir.to_string_lossy().to_string(),
        store_dir: store_dir.to_string_lossy().to_string(),
        sources: vec![source("docs")],
        transfer: TransferConfig {
            program: program.to_string_lossy().to_string(),
            ..Default::default()
        },
        compression: CompressionConfig::default(),
        email: EmailConfig::default(),
    }
}
