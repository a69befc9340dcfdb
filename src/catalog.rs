//! Raw records as they arrive from the dataset loader.
//!
//! These mirror the line-delimited JSON rows after column projection. They are
//! immutable once loaded; the engine indexes them into a [`FeatureStore`]
//! and a [`UserTable`].
//!
//! [`FeatureStore`]: crate::features::FeatureStore

use crate::error::{RecommendError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub type UserId = u32;
pub type TrackId = String;
pub type ArtistId = String;

/// One row of the track table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: TrackId,
    #[serde(default)]
    pub name: String,
    /// 0 to 100.
    pub popularity: u8,
    #[serde(rename = "id_artist")]
    pub artist_id: ArtistId,
    #[serde(default)]
    pub explicit: bool,
    pub duration_ms: f64,
    /// Date string; only the leading year is used.
    pub release_date: String,
    pub danceability: f64,
    pub energy: f64,
    pub key: f64,
    /// dB, conventionally negative.
    pub loudness: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
}

impl TrackRecord {
    /// Year prefix of `release_date` (`"1998"`, `"1998-04"`, `"1998-04-12"`).
    pub fn release_year(&self) -> Result<f64> {
        self.release_date
            .get(..4)
            .and_then(|year| year.parse::<u16>().ok())
            .map(f64::from)
            .ok_or_else(|| RecommendError::MalformedRecord {
                track: self.id.clone(),
                reason: format!("release date `{}` has no leading year", self.release_date),
            })
    }
}

/// One row of the artist table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: ArtistId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genres: BTreeSet<String>,
}

/// One row of the user table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "premium_user", default)]
    pub premium: bool,
    #[serde(default)]
    pub favourite_genres: BTreeSet<String>,
}

/// Listening event kinds that carry preference weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Play,
    Like,
    Skip,
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Contribution to the weighted preference average.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Play => 1.0,
            Self::Like => 2.0,
            Self::Skip => -1.0,
            Self::Other => 0.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Like => "like",
            Self::Skip => "skip",
            Self::Other => "other",
        }
    }
}

impl FromStr for EventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "play" => Self::Play,
            "like" => Self::Like,
            "skip" => Self::Skip,
            _ => Self::Other,
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single non-advertising listening event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub user_id: UserId,
    pub track_id: TrackId,
    pub kind: EventKind,
    #[serde(default)]
    pub timestamp: String,
}

/// Users keyed by id, built once.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    users: HashMap<UserId, UserRecord>,
}

impl UserTable {
    #[must_use]
    pub fn new(records: Vec<UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|user| (user.user_id, user))
            .collect();
        Self { users }
    }

    pub fn get(&self, user_id: UserId) -> Result<&UserRecord> {
        self.users
            .get(&user_id)
            .ok_or(RecommendError::UnknownUser(user_id))
    }

    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Event log grouped by user, so aggregation never rescans the full log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    by_user: HashMap<UserId, Vec<Event>>,
    total: usize,
}

impl EventLog {
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        let total = events.len();
        let mut by_user: HashMap<UserId, Vec<Event>> = HashMap::new();
        for event in events {
            by_user.entry(event.user_id).or_default().push(event);
        }
        Self { by_user, total }
    }

    /// Events for `user_id` in log order; empty when the user never listened.
    #[must_use]
    pub fn for_user(&self, user_id: UserId) -> &[Event] {
        self.by_user.get(&user_id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
