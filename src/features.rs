//! # Feature Store
//!
//! Normalized per-track feature vectors plus artist genre metadata, indexed by
//! id for O(1) lookup. Built once from the raw track and artist tables and
//! shared read-only afterwards.
//!
//! ## Normalization
//!
//! Each of the twelve audio attributes is normalized as a column across the
//! *whole* catalog, so a track's vector depends on every other track present at
//! build time. Loudness is taken by magnitude because it is dB-scale and
//! conventionally negative.

use crate::catalog::{ArtistId, ArtistRecord, TrackId, TrackRecord};
use crate::error::{RecommendError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Dimensionality of every track feature vector.
pub const FEATURE_COUNT: usize = 12;

/// Attribute order inside a feature vector.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "duration_ms",
    "release_year",
    "danceability",
    "energy",
    "key",
    "loudness",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// Column normalization applied at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// Divide each column by its Euclidean norm.
    #[default]
    L2,
    /// Rescale each column to `[0, 1]`.
    MinMax,
}

/// A catalog track after indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub id: TrackId,
    pub name: String,
    pub popularity: u8,
    pub artist_id: ArtistId,
    pub explicit: bool,
    pub features: Vec<f64>,
}

/// Read-only lookup table for tracks and artists.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    tracks: Vec<TrackEntry>,
    index: HashMap<TrackId, usize>,
    artists: HashMap<ArtistId, ArtistRecord>,
}

impl FeatureStore {
    /// Normalize and index the catalog.
    ///
    /// # Errors
    ///
    /// - [`RecommendError::EmptyCatalog`] when `tracks` is empty
    /// - [`RecommendError::UnknownArtist`] when a track references a missing artist
    /// - [`RecommendError::MalformedRecord`] for an unparseable release date, a
    ///   non-finite attribute or a popularity above 100
    pub fn build(
        tracks: Vec<TrackRecord>,
        artists: Vec<ArtistRecord>,
        normalization: Normalization,
    ) -> Result<Self> {
        if tracks.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let artists: HashMap<ArtistId, ArtistRecord> = artists
            .into_iter()
            .map(|artist| (artist.id.clone(), artist))
            .collect();

        let mut records = Vec::with_capacity(tracks.len());
        let mut index = HashMap::with_capacity(tracks.len());
        for record in tracks {
            if !artists.contains_key(&record.artist_id) {
                return Err(RecommendError::UnknownArtist(record.artist_id));
            }
            if index.contains_key(&record.id) {
                warn!("Duplicate track id `{}` ignored, keeping first occurrence", record.id);
                continue;
            }
            index.insert(record.id.clone(), records.len());
            records.push(record);
        }

        let raw = records
            .iter()
            .map(raw_attributes)
            .collect::<Result<Vec<_>>>()?;
        let columns = normalize_columns(&raw, normalization);

        let tracks = records
            .into_iter()
            .zip(columns)
            .map(|(record, features)| TrackEntry {
                id: record.id,
                name: record.name,
                popularity: record.popularity,
                artist_id: record.artist_id,
                explicit: record.explicit,
                features,
            })
            .collect::<Vec<_>>();

        info!(
            "Feature store built: {} tracks, {} artists, {:?} normalization",
            tracks.len(),
            artists.len(),
            normalization
        );

        Ok(Self {
            tracks,
            index,
            artists,
        })
    }

    /// Tracks in catalog order.
    #[must_use]
    pub fn tracks(&self) -> &[TrackEntry] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        FEATURE_COUNT
    }

    /// Catalog position of a track, used as the ranking tie-breaker.
    pub fn position(&self, track_id: &str) -> Result<usize> {
        self.index
            .get(track_id)
            .copied()
            .ok_or_else(|| RecommendError::UnknownTrack(track_id.to_string()))
    }

    pub fn track(&self, track_id: &str) -> Result<&TrackEntry> {
        self.position(track_id).map(|pos| &self.tracks[pos])
    }

    pub fn vector_of(&self, track_id: &str) -> Result<&[f64]> {
        self.track(track_id).map(|track| track.features.as_slice())
    }

    pub fn artist(&self, artist_id: &str) -> Result<&ArtistRecord> {
        self.artists
            .get(artist_id)
            .ok_or_else(|| RecommendError::UnknownArtist(artist_id.to_string()))
    }

    pub fn genres_of(&self, artist_id: &str) -> Result<&BTreeSet<String>> {
        self.artist(artist_id).map(|artist| &artist.genres)
    }

    pub fn genres_of_track(&self, track_id: &str) -> Result<&BTreeSet<String>> {
        let track = self.track(track_id)?;
        self.genres_of(&track.artist_id)
    }
}

fn raw_attributes(record: &TrackRecord) -> Result<[f64; FEATURE_COUNT]> {
    if record.popularity > 100 {
        return Err(RecommendError::MalformedRecord {
            track: record.id.clone(),
            reason: format!("popularity {} is outside 0..=100", record.popularity),
        });
    }

    let values = [
        record.duration_ms,
        record.release_year()?,
        record.danceability,
        record.energy,
        record.key,
        record.loudness.abs(),
        record.speechiness,
        record.acousticness,
        record.instrumentalness,
        record.liveness,
        record.valence,
        record.tempo,
    ];

    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(RecommendError::MalformedRecord {
            track: record.id.clone(),
            reason: format!("attribute `{}` is not finite", FEATURE_NAMES[pos]),
        });
    }
    Ok(values)
}

/// Normalize every column of `rows` across all rows.
fn normalize_columns(rows: &[[f64; FEATURE_COUNT]], normalization: Normalization) -> Vec<Vec<f64>> {
    let mut out = vec![vec![0.0; FEATURE_COUNT]; rows.len()];

    for col in 0..FEATURE_COUNT {
        let column = rows.iter().map(|row| row[col]);
        match normalization {
            Normalization::L2 => {
                let norm = column.map(|v| v * v).sum::<f64>().sqrt();
                if norm == 0.0 {
                    debug!("Column `{}` is all zeros", FEATURE_NAMES[col]);
                    continue;
                }
                for (row, normalized) in rows.iter().zip(out.iter_mut()) {
                    normalized[col] = row[col] / norm;
                }
            }
            Normalization::MinMax => {
                let (min, max) = column.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
                let span = max - min;
                if span == 0.0 {
                    debug!("Column `{}` is constant", FEATURE_NAMES[col]);
                    continue;
                }
                for (row, normalized) in rows.iter().zip(out.iter_mut()) {
                    normalized[col] = (row[col] - min) / span;
                }
            }
        }
    }

    out
}
