use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Fully resolved runtime configuration, passed into each component at
/// construction instead of being read from ambient process state.
#[derive(Debug, Clone)]
pub struct PackratConfig {
    /// Transient directory holding retrieved files before archiving.
    pub staging_dir: String,
    /// Durable directory holding all archives subject to rotation.
    pub store_dir: String,
    pub sources: Vec<SourceEntry>,
    pub transfer: TransferConfig,
    pub compression: CompressionConfig,
    pub email: EmailConfig,
}

/// YAML input for a remote source — either a plain name or a rich object.
/// A plain string may carry several comma-separated names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceInput {
    Simple(String),
    Rich {
        name: String,
        /// Source lives on a drive shared with the account rather than in it.
        #[serde(default)]
        shared_drive: bool,
    },
}

/// Canonical resolved remote source entry.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub name: String,
    pub shared_drive: bool,
}

/// How the external transfer tool is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Transfer program binary (default: rclone).
    #[serde(default = "default_transfer_program")]
    pub program: String,
    /// Remote name the sources live under, as `<remote>:<source>`.
    #[serde(default = "default_transfer_remote")]
    pub remote: String,
    /// Path to the transfer tool's own config file, if any.
    #[serde(default)]
    pub config_file: Option<String>,
    /// Extra arguments appended to every invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            program: default_transfer_program(),
            remote: default_transfer_remote(),
            config_file: None,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default = "default_compression_method")]
    pub method: ArchiveCompression,
    #[serde(default = "default_compression_level")]
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    Zstd,
    Deflate,
    Store,
}

impl ArchiveCompression {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveCompression::Zstd => "zstd",
            ArchiveCompression::Deflate => "deflate",
            ArchiveCompression::Store => "store",
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            method: default_compression_method(),
            level: default_compression_level(),
        }
    }
}

impl CompressionConfig {
    /// Clamp the level into the valid range for the selected method,
    /// warning if the configured value was out of bounds.
    pub fn validate(&mut self) {
        let (min, max) = match self.method {
            ArchiveCompression::Zstd => (1, 22),
            ArchiveCompression::Deflate => (1, 9),
            ArchiveCompression::Store => return,
        };
        if self.level < min || self.level > max {
            let clamped = self.level.clamp(min, max);
            tracing::warn!(
                configured = self.level,
                clamped,
                method = self.method.as_str(),
                "compression level out of range, clamping"
            );
            self.level = clamped;
        }
    }
}

/// Outbound status e-mail settings. Credentials are normally injected via
/// `${VAR}` placeholders in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Master switch; when false, notification calls are no-ops.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub recipient: String,
    /// Also send a one-paragraph summary when a run completes cleanly.
    #[serde(default)]
    pub notify_success: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            recipient: String::new(),
            notify_success: false,
        }
    }
}
