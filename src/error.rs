//! Errors raised by the recommendation engine.
//!
//! Everything here is a data or logic error: lookups are in-memory and
//! deterministic, so nothing is retried. The application layer wraps these
//! into `anyhow::Error` with file/record context.

use crate::catalog::{ArtistId, TrackId, UserId};
use thiserror::Error;

/// Errors produced while building the catalog or scoring a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendError {
    #[error("unknown user id {0}")]
    UnknownUser(UserId),

    #[error("unknown track id `{0}`")]
    UnknownTrack(TrackId),

    #[error("unknown artist id `{0}`")]
    UnknownArtist(ArtistId),

    #[error("a playlist needs at least one user")]
    EmptyUserSet,

    #[error("no preference vector can be formed: users {users:?} have zero total event weight")]
    UndefinedPreferenceVector { users: Vec<UserId> },

    #[error("request was prepared without a {0}")]
    MissingPreference(&'static str),

    #[error("cosine similarity against a zero-norm vector")]
    ZeroNormVector,

    #[error("vector length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("malformed record for track `{track}`: {reason}")]
    MalformedRecord { track: TrackId, reason: String },

    #[error("playlist size must be positive")]
    InvalidPlaylistSize,

    #[error("catalog contains no tracks")]
    EmptyCatalog,
}

/// Engine-level result alias.
pub type Result<T, E = RecommendError> = std::result::Result<T, E>;
