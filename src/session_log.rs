//! Append-only feedback log.
//!
//! Every reaction to a recommended track becomes one JSON line. A playlist
//! opens a session: its id continues from the last logged entry, and the
//! session (id, serving model, tracks) is kept next to the log so that every
//! later reaction to that playlist shares it.

use crate::algorithm::StrategyKind;
use crate::catalog::{EventKind, TrackId, UserId};
use crate::features::FeatureStore;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One logged reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub session_id: u64,
    pub timestamp: String,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub event_type: EventKind,
    pub model_type: StrategyKind,
}

impl FeedbackEntry {
    /// Entry stamped with the local time.
    #[must_use]
    pub fn now(
        session_id: u64,
        user_id: UserId,
        track_id: TrackId,
        event_type: EventKind,
        model_type: StrategyKind,
    ) -> Self {
        Self::at(
            Local::now().naive_local(),
            session_id,
            user_id,
            track_id,
            event_type,
            model_type,
        )
    }

    #[must_use]
    pub fn at(
        time: NaiveDateTime,
        session_id: u64,
        user_id: UserId,
        track_id: TrackId,
        event_type: EventKind,
        model_type: StrategyKind,
    ) -> Self {
        Self {
            session_id,
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            user_id,
            track_id,
            event_type,
            model_type,
        }
    }
}

/// Session id following the last logged one, or `default` for a missing or empty log.
pub fn next_session_id(path: &Path, default: u64) -> Result<u64> {
    if !path.exists() {
        return Ok(default);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feedback log {}", path.display()))?;

    let Some(last) = contents.lines().rev().find(|line| !line.trim().is_empty()) else {
        return Ok(default);
    };
    let entry: FeedbackEntry = serde_json::from_str(last)
        .with_context(|| format!("Last line of {} is not a feedback entry", path.display()))?;
    Ok(entry.session_id + 1)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    Ok(())
}

/// Append `entries` to the log, one JSON object per line.
pub fn append(path: &Path, entries: &[FeedbackEntry]) -> Result<()> {
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open feedback log {}", path.display()))?;

    for entry in entries {
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")
            .with_context(|| format!("Failed to write to feedback log {}", path.display()))?;
    }

    debug!("Appended {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Read the whole log back.
pub fn read(path: &Path) -> Result<Vec<FeedbackEntry>> {
    crate::loader::read_jsonl(path)
}

/// The playlist that reactions are currently logged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSession {
    pub session_id: u64,
    /// Strategy that actually served the playlist.
    pub model_type: StrategyKind,
    pub user_ids: Vec<UserId>,
    pub track_ids: Vec<TrackId>,
}

/// Where the open session of the log at `log_path` is kept.
#[must_use]
pub fn session_path(log_path: &Path) -> PathBuf {
    log_path.with_extension("session.json")
}

/// The open session, if a playlist has been created against this log.
pub fn current_session(log_path: &Path) -> Result<Option<PlaylistSession>> {
    let path = session_path(log_path);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    let session = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid session file {}", path.display()))?;
    Ok(Some(session))
}

/// Start a session for a freshly served playlist and make it the current one.
///
/// The id follows both the last logged entry and the previous session, so a
/// playlist nobody reacted to still consumes its id.
pub fn open_session(
    log_path: &Path,
    default_session_id: u64,
    model_type: StrategyKind,
    user_ids: &[UserId],
    track_ids: &[TrackId],
) -> Result<PlaylistSession> {
    let mut session_id = next_session_id(log_path, default_session_id)?;
    if let Some(previous) = current_session(log_path)? {
        session_id = session_id.max(previous.session_id + 1);
    }

    let session = PlaylistSession {
        session_id,
        model_type,
        user_ids: user_ids.to_vec(),
        track_ids: track_ids.to_vec(),
    };

    let path = session_path(log_path);
    ensure_parent(&path)?;
    fs::write(&path, serde_json::to_string_pretty(&session)?)
        .with_context(|| format!("Failed to write session file {}", path.display()))?;
    debug!("Opened session {session_id} ({model_type}) in {}", path.display());
    Ok(session)
}

/// Validate a reaction against the catalog and append it under `session`.
///
/// # Errors
///
/// Fails for a track missing from the catalog and on any write error.
pub fn log_reaction(
    log_path: &Path,
    store: &FeatureStore,
    session: &PlaylistSession,
    user_id: UserId,
    track_id: TrackId,
    event_type: EventKind,
) -> Result<FeedbackEntry> {
    store
        .track(&track_id)
        .with_context(|| format!("Cannot log {event_type} for user {user_id}"))?;
    if !session.track_ids.is_empty() && !session.track_ids.contains(&track_id) {
        warn!(
            "Track `{track_id}` was not part of session {} playlist",
            session.session_id
        );
    }
    let entry = FeedbackEntry::now(
        session.session_id,
        user_id,
        track_id,
        event_type,
        session.model_type,
    );
    append(log_path, std::slice::from_ref(&entry))?;
    Ok(entry)
}
