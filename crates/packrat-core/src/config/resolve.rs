use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::types::*;
use super::util::expand_tilde;
use crate::error::{PackratError, Result};

/// Intermediate deserialization struct for the YAML config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    staging_dir: String,
    store_dir: String,
    #[serde(default)]
    sources: Vec<SourceInput>,
    #[serde(default)]
    transfer: TransferConfig,
    #[serde(default)]
    compression: CompressionConfig,
    #[serde(default)]
    email: EmailConfig,
}

/// Expand `${VAR}` and `${VAR:-default}` placeholders in raw config text,
/// so credentials and paths stay environment-sourced.
fn expand_env_placeholders(input: &str, path: &Path) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0usize;

    while let Some(offset) = input[cursor..].find("${") {
        let start = cursor + offset;
        out.push_str(&input[cursor..start]);

        let token_start = start + 2;
        let Some(token_end_rel) = input[token_start..].find('}') else {
            return Err(expand_error(path, "unterminated environment placeholder"));
        };
        let token_end = token_start + token_end_rel;
        out.push_str(&resolve_env_token(&input[token_start..token_end], path)?);
        cursor = token_end + 1;
    }

    out.push_str(&input[cursor..]);
    Ok(out)
}

fn resolve_env_token(token: &str, path: &Path) -> Result<String> {
    let (name, default) = match token.find(":-") {
        Some(split_at) => (&token[..split_at], Some(&token[split_at + 2..])),
        None => (token, None),
    };
    if !is_valid_env_var_name(name) {
        return Err(expand_error(
            path,
            format!("invalid environment placeholder '{token}'"),
        ));
    }

    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) | Err(std::env::VarError::NotPresent) => match default {
            Some(d) => Ok(d.to_string()),
            None => Err(expand_error(
                path,
                format!("environment variable '{name}' is not set"),
            )),
        },
        Err(std::env::VarError::NotUnicode(_)) => Err(expand_error(
            path,
            format!("environment variable '{name}' is not valid UTF-8"),
        )),
    }
}

fn is_valid_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return false;
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn expand_error(path: &Path, message: impl fmt::Display) -> PackratError {
    PackratError::Config(format!("invalid config '{}': {message}", path.display()))
}

/// Load a config file into a resolved [`PackratConfig`].
pub fn load(path: &Path) -> Result<PackratConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PackratError::Config(format!("cannot read '{}': {e}", path.display())))?;
    let expanded = expand_env_placeholders(&contents, path)?;
    let raw: ConfigDocument = serde_yaml::from_str(&expanded)
        .map_err(|e| PackratError::Config(format!("invalid config '{}': {e}", path.display())))?;

    resolve_document(raw)
}

fn resolve_document(mut raw: ConfigDocument) -> Result<PackratConfig> {
    if raw.staging_dir.trim().is_empty() {
        return Err(PackratError::Config("'staging_dir' must not be empty".into()));
    }
    if raw.store_dir.trim().is_empty() {
        return Err(PackratError::Config("'store_dir' must not be empty".into()));
    }

    let sources = normalize_sources(raw.sources)?;
    if sources.is_empty() {
        return Err(PackratError::Config(
            "'sources:' must name at least one remote source".into(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for src in &sources {
        if !seen.insert(src.name.as_str()) {
            return Err(PackratError::Config(format!(
                "duplicate source name: '{}'",
                src.name
            )));
        }
    }

    if raw.transfer.program.trim().is_empty() {
        return Err(PackratError::Config(
            "'transfer.program' must not be empty".into(),
        ));
    }

    if raw.email.enabled {
        if raw.email.username.is_empty() {
            return Err(PackratError::Config(
                "email is enabled but 'email.username' is empty".into(),
            ));
        }
        if raw.email.recipient.is_empty() {
            return Err(PackratError::Config(
                "email is enabled but 'email.recipient' is empty".into(),
            ));
        }
    }

    raw.compression.validate();

    Ok(PackratConfig {
        staging_dir: expand_tilde(&raw.staging_dir),
        store_dir: expand_tilde(&raw.store_dir),
        sources,
        transfer: raw.transfer,
        compression: raw.compression,
        email: raw.email,
    })
}

/// Normalize source inputs. Plain strings may carry several comma-separated
/// names (matching a `${REMOTE_FOLDERS}` placeholder holding a list).
fn normalize_sources(inputs: Vec<SourceInput>) -> Result<Vec<SourceEntry>> {
    let mut entries = Vec::new();
    for input in inputs {
        match input {
            SourceInput::Simple(value) => {
                for name in value.split(',') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    entries.push(SourceEntry {
                        name: name.to_string(),
                        shared_drive: false,
                    });
                }
            }
            SourceInput::Rich { name, shared_drive } => {
                if name.trim().is_empty() {
                    return Err(PackratError::Config(
                        "source 'name' must not be empty".into(),
                    ));
                }
                entries.push(SourceEntry {
                    name: name.trim().to_string(),
                    shared_drive,
                });
            }
        }
    }
    Ok(entries)
}

/// Tracks where the config file was found.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Explicitly passed via `--config`.
    CliArg(PathBuf),
    /// Set via the `PACKRAT_CONFIG` env var.
    EnvVar(PathBuf),
    /// Found by searching standard locations.
    SearchOrder { path: PathBuf, level: &'static str },
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::CliArg(p) => p,
            ConfigSource::EnvVar(p) => p,
            ConfigSource::SearchOrder { path, .. } => path,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CliArg(p) => write!(f, "{} (--config)", p.display()),
            ConfigSource::EnvVar(p) => write!(f, "{} (PACKRAT_CONFIG)", p.display()),
            ConfigSource::SearchOrder { path, level } => {
                write!(f, "{} ({})", path.display(), level)
            }
        }
    }
}

/// Returns search locations in priority order: project, user, system.
pub fn default_config_search_paths() -> Vec<(PathBuf, &'static str)> {
    let mut paths = vec![(PathBuf::from("packrat.yaml"), "project")];

    #[cfg(windows)]
    let user_config = dirs::config_dir().map(|base| base.join("packrat").join("config.yaml"));

    #[cfg(not(windows))]
    let user_config = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|base| base.join("packrat").join("config.yaml"));

    if let Some(p) = user_config {
        paths.push((p, "user"));
    }

    #[cfg(windows)]
    {
        let program_data = std::env::var_os("PROGRAMDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"));
        paths.push((program_data.join("packrat").join("config.yaml"), "system"));
    }

    #[cfg(not(windows))]
    paths.push((PathBuf::from("/etc/packrat/config.yaml"), "system"));

    paths
}

/// Resolve which config file to use.
///
/// Priority: CLI arg > `PACKRAT_CONFIG` env var > first existing file from
/// the search paths. Returns `None` if nothing is found.
pub fn resolve_config_path(cli_config: Option<&str>) -> Option<ConfigSource> {
    if let Some(path) = cli_config {
        return Some(ConfigSource::CliArg(PathBuf::from(path)));
    }

    if let Ok(val) = std::env::var("PACKRAT_CONFIG") {
        if !val.is_empty() {
            return Some(ConfigSource::EnvVar(PathBuf::from(val)));
        }
    }

    for (path, level) in default_config_search_paths() {
        if path.exists() {
            return Some(ConfigSource::SearchOrder { path, level });
        }
    }

    None
}

/// Returns a minimal YAML config template suitable for bootstrapping.
pub fn minimal_config_template() -> &'static str {
    r#"# packrat configuration file
# Minimal required configuration.

staging_dir: ../tempbackups
store_dir: ../backups

sources:
  - DriveSyncFiles

# --- Common optional settings (uncomment as needed) ---

# transfer:
#   program: rclone
#   remote: mygdrive
#   config_file: rclone.conf
#
# compression:
#   method: zstd
#   level: 19
#
# email:
#   enabled: true
#   username: "${GMAIL_USERNAME}"
#   password: "${GMAIL_PASSWORD}"
#   recipient: "${GMAIL_RECEIVER}"
"#
}
