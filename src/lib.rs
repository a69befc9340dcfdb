//! Group playlist recommendations from declared genres and listening history.
//!
//! Core modules:
//! - [`features`] - Feature Store: normalized track vectors and genre lookup
//! - [`preference`] - Preference Aggregator: group vectors and genre profiles
//! - [`algorithm`] - Scoring strategies (popularity, similarity, hybrid)
//! - [`ranker`] - Deterministic ranking and truncation
//! - [`playlist`] - Model construction and playlist requests
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Record types, user table and event log
//! - [`loader`] - Line-delimited JSON dataset loading
//! - [`session_log`] - Append-only feedback log
//! - [`history`] - Per-user listening history
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use cadence::{loader, playlist};
//! use cadence::algorithm::{ScoringContext, StrategyKind};
//!
//! let data = loader::load_dataset(std::path::Path::new("data"))?;
//! let models = playlist::build_models(
//!     data.users,
//!     data.tracks,
//!     data.artists,
//!     data.events,
//!     ScoringContext::default(),
//! )?;
//!
//! let hybrid = &models[&StrategyKind::Hybrid];
//! for scored in playlist::get_playlist_with_scores(hybrid, &[101, 102], 10, None)? {
//!     println!("{} {:.3}", scored.track_id, scored.score);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Algorithm Details
//!
//! ### Popularity
//! `popularity + (100 - popularity) * (matches - 0.1) * coefficient / group_size`,
//! where `matches` sums, over the track's artist genres, how many group
//! members declared each genre.
//!
//! ### Similarity
//! Cosine similarity between the track's feature vector and the group
//! preference vector. Each user's vector is the event-weighted average of the
//! tracks they listened to (play 1, like 2, skip -1, other 0); the group
//! vector averages users equally.
//!
//! ### Hybrid
//! `similarity * 100 + popularity`.
//!
//! ## Error Handling
//!
//! Engine functions return [`error::RecommendError`]; loaders, config and the
//! binary use `anyhow::Result` with file and record context. Unknown ids, empty
//! groups, zero-weight histories and zero-norm vectors are all reported, never
//! skipped.
//!
//! ## Concurrency
//!
//! The [`playlist::Catalog`] is immutable after construction and shared through
//! an `Arc`; every request builds its own preference state, so recommenders
//! can serve concurrent requests without locking.

pub mod algorithm;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod features;
pub mod history;
pub mod loader;
pub mod playlist;
pub mod preference;
pub mod ranker;
pub mod session_log;

pub use error::RecommendError;
pub use playlist::{build_models, get_playlist, get_playlist_with_scores};
