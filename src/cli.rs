//! # Command-Line Interface Module
//!
//! Clap definitions for the `cadence` binary.
//!
//! ## Commands
//!
//! - `playlist`: rank tracks for one or more users
//! - `history`: show what a user has listened to
//! - `feedback`: record a reaction to a recommended track
//! - `completion`: print shell completions
//!
//! ## Examples
//!
//! ```bash
//! cadence playlist --user 101 --user 205 --size 15
//! cadence playlist -u 101 --model similarity --scores
//! cadence feedback --user 101 --track 0RNxWy0PC3AyH4ThH3aGK6 --event like
//! ```

use crate::algorithm::StrategyKind;
use crate::catalog::{EventKind, TrackId, UserId};
use crate::playlist::ab_strategy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Which model serves a playlist request.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Model {
    /// A/B assignment by the first user's id
    Auto,
    /// Genre-boosted popularity
    Popularity,
    /// Listening-history similarity
    Similarity,
    /// Similarity plus genre-boosted popularity
    Hybrid,
}

impl Model {
    /// Concrete strategy; `Auto` splits on `lead_user` against `split`.
    #[must_use]
    pub const fn resolve(self, lead_user: UserId, split: UserId) -> StrategyKind {
        match self {
            Self::Auto => ab_strategy(lead_user, split),
            Self::Popularity => StrategyKind::Popularity,
            Self::Similarity => StrategyKind::Similarity,
            Self::Hybrid => StrategyKind::Hybrid,
        }
    }
}

/// Reactions a listener can log.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Reaction {
    Like,
    Play,
    Skip,
}

impl From<Reaction> for EventKind {
    fn from(reaction: Reaction) -> Self {
        match reaction {
            Reaction::Like => Self::Like,
            Reaction::Play => Self::Play,
            Reaction::Skip => Self::Skip,
        }
    }
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Cadence: group playlists from declared genres and listening history")]
#[command(version)]
pub struct Args {
    /// Directory with tracks.jsonl, artists.jsonl, users.jsonl and sessions.jsonl
    #[arg(long, global = true, env = "CADENCE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Feedback log file
    #[arg(long, global = true, env = "CADENCE_LOG")]
    pub log_file: Option<PathBuf>,

    /// Config file (defaults to config.json in the Cadence data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend a playlist for one or more users
    ///
    /// Every listed user contributes declared genres and listening history.
    /// Larger groups lean more on raw popularity.
    Playlist {
        /// User id; repeat for a group playlist
        #[arg(short, long = "user", required = true)]
        users: Vec<UserId>,

        /// Recommendation model
        #[arg(short, long, value_enum, default_value_t = Model::Auto)]
        model: Model,

        /// Number of tracks (defaults to the configured playlist size)
        #[arg(short, long)]
        size: Option<usize>,

        /// Only rank these track ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        candidates: Vec<TrackId>,

        /// Only rank this many randomly picked tracks
        #[arg(long, conflicts_with = "candidates")]
        random_candidates: Option<usize>,

        /// Print scores next to each track
        #[arg(long)]
        scores: bool,

        /// Print the ranked list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a user's listening history
    History {
        #[arg(short, long)]
        user: UserId,
    },

    /// Record a reaction to a recommended track in the feedback log
    ///
    /// Reactions join the session opened by the last `playlist` command.
    Feedback {
        #[arg(short, long)]
        user: UserId,

        #[arg(short, long)]
        track: TrackId,

        #[arg(short, long, value_enum)]
        event: Reaction,

        /// Model that recommended the track (defaults to the one that served the open session)
        #[arg(short, long, value_enum)]
        model: Option<Model>,

        /// Session id (defaults to the session opened by the last `playlist`)
        #[arg(long)]
        session: Option<u64>,
    },

    /// Generate shell completions
    ///
    /// Usage: cadence completion bash > ~/.local/share/bash-completion/completions/cadence
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List known user ids for completion (hidden command)
    #[command(hide = true)]
    CompleteUsers,
}
