//! # Configuration Module
//!
//! Runtime configuration and data directory management for Cadence.
//!
//! ## Data Storage
//!
//! Cadence keeps its files in the platform-standard data directory:
//! - Linux: `~/.local/share/cadence/`
//! - macOS: `~/Library/Application Support/cadence/`
//! - Windows: `%APPDATA%\cadence\`
//!
//! Inside it, `data/` holds the `*.jsonl` dataset tables, `log.jsonl` is the
//! feedback log and an optional `config.json` overrides any default below.
//! Command-line flags override the file.

use crate::algorithm::ScoringContext;
use crate::catalog::UserId;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate data directory for Cadence, creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The cadence subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| anyhow::anyhow!(
        "Could not determine system data directory. Please ensure your platform supports standard data directories."
    ))?;

    let cadence_dir = data_dir.join("cadence");
    fs::create_dir_all(&cadence_dir).with_context(|| {
        format!(
            "Failed to create Cadence data directory at {}. Please check file permissions.",
            cadence_dir.display()
        )
    })?;

    Ok(cadence_dir)
}

/// Default location of the optional config file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory holding `tracks.jsonl`, `artists.jsonl`, `users.jsonl`, `sessions.jsonl`
    pub data_dir: PathBuf,
    /// Append-only feedback log
    pub log_path: PathBuf,
    /// First session id when the log is empty
    pub default_session_id: u64,
    /// Users above this id get the similarity model in `auto` mode
    pub ab_split_user_id: UserId,
    pub playlist_size: usize,
    pub scoring: ScoringContext,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let base = get_data_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            data_dir: base.join("data"),
            log_path: base.join("log.jsonl"),
            default_session_id: 60000,
            ab_split_user_id: 300,
            playlist_size: 10,
            scoring: ScoringContext::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from `path`, or from the default config file when it exists.
    ///
    /// An explicit `path` must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = get_config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    debug!("No config file at {}, using defaults", default_path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
