//! # Cadence - Group Playlist Recommender
//!
//! Recommends a short, ordered list of tracks for one or more listeners by
//! combining their declared favourite genres with their listening history.
//!
//! ## Usage
//!
//! ```bash
//! # Playlist for two users, model chosen by A/B split
//! cadence playlist --user 101 --user 205
//!
//! # Inspect scores of the hybrid model
//! cadence playlist -u 101 --model hybrid --scores
//!
//! # React to a track of the last playlist (joins its session)
//! cadence feedback -u 101 -t 0RNxWy0PC3AyH4ThH3aGK6 -e like
//!
//! # What has a user listened to?
//! cadence history --user 101
//! ```

use anyhow::{bail, Context, Result};
use cadence::algorithm::StrategyKind;
use cadence::catalog::{EventKind, TrackId};
use cadence::cli::{self, Command, Model};
use cadence::config::RuntimeConfig;
use cadence::playlist::{self, Recommender, ScoredTrack};
use cadence::session_log::{self, PlaylistSession};
use cadence::{completion, history, loader};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use std::collections::BTreeMap;

/// Main entry point for the Cadence application.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug cadence playlist -u 101` - Enable debug logging
/// - `RUST_LOG=cadence::algorithm=trace cadence playlist -u 101` - Per-track scores
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let mut config = RuntimeConfig::load(args.config.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_file) = args.log_file {
        config.log_path = log_file;
    }
    debug!("Runtime config: {config:?}");

    match args.command {
        Command::Playlist {
            users,
            model,
            size,
            candidates,
            random_candidates,
            scores,
            json,
        } => {
            let models = load_models(&config)?;
            let lead_user = users.first().copied().unwrap_or_default();
            let kind = model.resolve(lead_user, config.ab_split_user_id);
            let recommender = &models[&kind];
            let size = size.unwrap_or(config.playlist_size);

            let restriction: Option<Vec<TrackId>> = match random_candidates {
                Some(n) => Some(playlist::random_candidates(
                    &recommender.catalog().store,
                    n,
                    &mut rand::thread_rng(),
                )),
                None if !candidates.is_empty() => Some(candidates),
                None => None,
            };

            info!("Creating {kind} playlist of {size} tracks for users {users:?}");
            let ranked = playlist::get_playlist_with_scores(
                recommender,
                &users,
                size,
                restriction.as_deref(),
            )
            .with_context(|| format!("Failed to create a playlist for users {users:?}"))?;

            let track_ids: Vec<TrackId> = ranked.iter().map(|s| s.track_id.clone()).collect();
            let session = session_log::open_session(
                &config.log_path,
                config.default_session_id,
                kind,
                &users,
                &track_ids,
            )?;

            print_playlist(recommender, &session, &ranked, scores, json)?;
        }
        Command::History { user } => {
            let models = load_models(&config)?;
            let catalog = models[&StrategyKind::Popularity].catalog();
            catalog
                .users
                .get(user)
                .with_context(|| format!("Cannot show history for user {user}"))?;

            let played = history::played_tracks(user, &catalog.events);
            println!("User's (id={user}) song history:");
            for (track_id, _) in &played {
                println!("\t* {}", history::describe(track_id, &catalog.store)?);
            }
            println!("User (id={user}) listened to {} songs", played.len());
        }
        Command::Feedback {
            user,
            track,
            event,
            model,
            session,
        } => {
            let models = load_models(&config)?;
            let catalog = models[&StrategyKind::Popularity].catalog();
            catalog
                .users
                .get(user)
                .with_context(|| format!("Cannot log feedback for user {user}"))?;

            let mut target = match session_log::current_session(&config.log_path)? {
                Some(current) if session.map_or(true, |id| id == current.session_id) => current,
                _ => {
                    let Some(session_id) = session else {
                        bail!(
                            "No open playlist session for {}. Create a playlist first or pass --session",
                            config.log_path.display()
                        );
                    };
                    PlaylistSession {
                        session_id,
                        model_type: Model::Auto.resolve(user, config.ab_split_user_id),
                        user_ids: vec![user],
                        track_ids: Vec::new(),
                    }
                }
            };
            if let Some(model) = model {
                target.model_type = model.resolve(user, config.ab_split_user_id);
            }

            let entry = session_log::log_reaction(
                &config.log_path,
                &catalog.store,
                &target,
                user,
                track,
                EventKind::from(event),
            )?;
            println!(
                "Logged {} of `{}` for user {} (session {}, {})",
                entry.event_type, entry.track_id, entry.user_id, entry.session_id, entry.model_type
            );
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
        Command::CompleteUsers => {
            completion::print_user_completions(&config.data_dir)?;
        }
    }

    Ok(())
}

fn load_models(config: &RuntimeConfig) -> Result<BTreeMap<StrategyKind, Recommender>> {
    let dataset = loader::load_dataset(&config.data_dir)?;
    playlist::build_models(
        dataset.users,
        dataset.tracks,
        dataset.artists,
        dataset.events,
        config.scoring.clone(),
    )
    .with_context(|| format!("Failed to build models from {}", config.data_dir.display()))
}

fn print_playlist(
    recommender: &Recommender,
    session: &PlaylistSession,
    ranked: &[ScoredTrack],
    scores: bool,
    json: bool,
) -> Result<()> {
    if json {
        eprintln!("Session {} ({})", session.session_id, session.model_type);
        println!("{}", serde_json::to_string_pretty(ranked)?);
        return Ok(());
    }

    println!("Session {} ({}):", session.session_id, session.model_type);
    let store = &recommender.catalog().store;
    for (i, scored) in ranked.iter().enumerate() {
        let name = history::describe(&scored.track_id, store)?;
        match scores {
            true => println!("{:>3}. {name} [{}] {:.3}", i + 1, scored.track_id, scored.score),
            false => println!("{:>3}. {name}", i + 1),
        }
    }
    Ok(())
}
