//! Listening history for a single user.

use crate::catalog::{EventLog, TrackId, UserId};
use crate::error::Result;
use crate::features::FeatureStore;
use std::collections::HashMap;

/// Tracks a user has events for, with event counts, in first-seen order.
#[must_use]
pub fn played_tracks(user_id: UserId, events: &EventLog) -> Vec<(TrackId, usize)> {
    let mut played: Vec<(TrackId, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for event in events.for_user(user_id) {
        match slots.get(event.track_id.as_str()) {
            Some(&slot) => played[slot].1 += 1,
            None => {
                slots.insert(event.track_id.as_str(), played.len());
                played.push((event.track_id.clone(), 1));
            }
        }
    }
    played
}

/// `"<track name>" - <artist name>`
pub fn describe(track_id: &str, store: &FeatureStore) -> Result<String> {
    let track = store.track(track_id)?;
    let artist = store.artist(&track.artist_id)?;
    Ok(format!("\"{}\" - {}", track.name, artist.name))
}
