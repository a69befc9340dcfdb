//! Line-delimited JSON dataset loading.
//!
//! Each table lives in `<dir>/<name>.jsonl`, one JSON object per line. Rows
//! are projected onto the record types in [`crate::catalog`]; extra columns
//! are ignored. Advertising events are dropped here so the engine never sees
//! them.

use crate::catalog::{ArtistRecord, Event, EventKind, TrackId, TrackRecord, UserId, UserRecord};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const TRACKS_FILE: &str = "tracks.jsonl";
pub const ARTISTS_FILE: &str = "artists.jsonl";
pub const USERS_FILE: &str = "users.jsonl";
pub const SESSIONS_FILE: &str = "sessions.jsonl";

/// Event types that never reach the engine. The dataset spells it `advertisment`.
const ADVERTISING_EVENTS: [&str; 2] = ["advertisment", "advertisement"];

/// All four tables.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub users: Vec<UserRecord>,
    pub tracks: Vec<TrackRecord>,
    pub artists: Vec<ArtistRecord>,
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    #[serde(default)]
    timestamp: String,
    user_id: UserId,
    #[serde(default)]
    track_id: Option<TrackId>,
    event_type: String,
}

/// Parse every non-blank line of `path` as a `T`.
///
/// # Errors
///
/// Fails on I/O errors and on the first line that does not deserialize,
/// naming the file and 1-based line number.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset file {}", path.display()))?;

    let mut rows = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).with_context(|| {
            format!("Malformed record at {}:{}", path.display(), number + 1)
        })?;
        rows.push(row);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_tracks(dir: &Path) -> Result<Vec<TrackRecord>> {
    read_jsonl(&dir.join(TRACKS_FILE))
}

pub fn load_artists(dir: &Path) -> Result<Vec<ArtistRecord>> {
    read_jsonl(&dir.join(ARTISTS_FILE))
}

pub fn load_users(dir: &Path) -> Result<Vec<UserRecord>> {
    read_jsonl(&dir.join(USERS_FILE))
}

/// Session events without advertising rows.
pub fn load_events(dir: &Path) -> Result<Vec<Event>> {
    let path = dir.join(SESSIONS_FILE);
    let rows: Vec<SessionRow> = read_jsonl(&path)?;
    let total = rows.len();

    let mut events = Vec::with_capacity(total);
    for row in rows {
        if ADVERTISING_EVENTS.contains(&row.event_type.as_str()) {
            continue;
        }
        let Some(track_id) = row.track_id else {
            bail!(
                "`{}` event of user {} in {} has no track id",
                row.event_type,
                row.user_id,
                path.display()
            );
        };
        let kind = row.event_type.parse::<EventKind>().unwrap_or(EventKind::Other);
        events.push(Event {
            user_id: row.user_id,
            track_id,
            kind,
            timestamp: row.timestamp,
        });
    }

    debug!("Dropped {} advertising events", total - events.len());
    Ok(events)
}

/// Load users, tracks, artists and session events from `dir`.
pub fn load_dataset(dir: &Path) -> Result<Dataset> {
    let dataset = Dataset {
        users: load_users(dir)?,
        tracks: load_tracks(dir)?,
        artists: load_artists(dir)?,
        events: load_events(dir)?,
    };
    info!(
        "Loaded dataset from {}: {} users, {} tracks, {} artists, {} events",
        dir.display(),
        dataset.users.len(),
        dataset.tracks.len(),
        dataset.artists.len(),
        dataset.events.len()
    );
    Ok(dataset)
}
