//! # Integration Tests for Cadence
//!
//! End-to-end checks from JSONL files on disk through model construction to
//! ranked playlists and the feedback log.

use anyhow::Result;
use cadence::algorithm::StrategyKind;
use cadence::playlist::Recommender;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn track_line(id: &str, artist: &str, popularity: u8, seed: f64) -> String {
    format!(
        r#"{{"id": "{id}", "name": "Song {id}", "popularity": {popularity}, "duration_ms": {duration}, "explicit": false, "id_artist": "{artist}", "release_date": "{year}-03-01", "danceability": {dance}, "energy": {energy}, "key": {key}, "loudness": {loud}, "speechiness": 0.05, "acousticness": {acoustic}, "instrumentalness": 0.0, "liveness": 0.1, "valence": {valence}, "tempo": {tempo}}}"#,
        duration = 180_000.0 + seed * 10_000.0,
        year = 1990 + (seed as u32) * 3,
        dance = 0.2 + seed * 0.1,
        energy = 0.9 - seed * 0.1,
        key = (seed as u32) % 12,
        loud = -4.0 - seed,
        acoustic = 0.1 * seed,
        valence = 0.5 + 0.05 * seed,
        tempo = 90.0 + seed * 8.0,
    )
}

/// Test helper to create a temporary dataset directory with sample data
fn create_test_dataset() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let path = dir.path();

    let tracks = [
        track_line("t1", "a_pop", 10, 1.0),
        track_line("t2", "a_rock", 50, 2.0),
        track_line("t3", "a_pop", 90, 3.0),
        track_line("t4", "a_jazz", 40, 4.0),
        track_line("t5", "a_rock", 40, 5.0),
    ];
    fs::write(path.join("tracks.jsonl"), tracks.join("\n"))?;

    fs::write(
        path.join("artists.jsonl"),
        r#"{"id": "a_pop", "name": "Pop Star", "genres": ["pop", "dance pop"]}
{"id": "a_rock", "name": "Rockers", "genres": ["rock"]}
{"id": "a_jazz", "name": "Trio", "genres": ["jazz"]}
"#,
    )?;

    fs::write(
        path.join("users.jsonl"),
        r#"{"user_id": 101, "name": "Ann", "premium_user": true, "favourite_genres": ["rock"]}
{"user_id": 102, "name": "Bob", "premium_user": false, "favourite_genres": ["jazz", "rock"]}
{"user_id": 103, "name": "Cid", "premium_user": false, "favourite_genres": []}
"#,
    )?;

    fs::write(
        path.join("sessions.jsonl"),
        r#"{"session_id": 1, "timestamp": "2021-04-01T10:00:00.000", "user_id": 101, "track_id": "t2", "event_type": "like"}
{"session_id": 1, "timestamp": "2021-04-01T10:03:00.000", "user_id": 101, "track_id": null, "event_type": "advertisment"}
{"session_id": 1, "timestamp": "2021-04-01T10:04:00.000", "user_id": 101, "track_id": "t5", "event_type": "play"}
{"session_id": 2, "timestamp": "2021-04-02T10:00:00.000", "user_id": 102, "track_id": "t4", "event_type": "play"}
{"session_id": 1, "timestamp": "2021-04-01T10:07:00.000", "user_id": 101, "track_id": "t1", "event_type": "skip"}
{"session_id": 2, "timestamp": "2021-04-02T10:03:00.000", "user_id": 102, "track_id": "t4", "event_type": "like"}
{"session_id": 3, "timestamp": "2021-04-03T10:00:00.000", "user_id": 103, "track_id": "t3", "event_type": "browse"}
"#,
    )?;

    Ok(dir)
}

fn build(path: &Path) -> Result<BTreeMap<StrategyKind, Recommender>> {
    let data = cadence::loader::load_dataset(path)?;
    Ok(cadence::build_models(
        data.users,
        data.tracks,
        data.artists,
        data.events,
        cadence::algorithm::ScoringContext::default(),
    )?)
}

#[cfg(test)]
mod dataset_tests {
    use super::*;
    use cadence::catalog::EventKind;
    use cadence::loader;

    #[test]
    fn test_dataset_loads_and_filters_ads() -> Result<()> {
        let dir = create_test_dataset()?;
        let data = loader::load_dataset(dir.path())?;

        assert_eq!(data.tracks.len(), 5);
        assert_eq!(data.artists.len(), 3);
        assert_eq!(data.users.len(), 3);
        assert_eq!(data.events.len(), 6);
        assert_eq!(data.events.last().map(|e| e.kind), Some(EventKind::Other));

        Ok(())
    }
}

#[cfg(test)]
mod playlist_tests {
    use super::*;
    use cadence::{get_playlist, get_playlist_with_scores, RecommendError};
    use std::collections::BTreeSet;

    #[test]
    fn test_every_model_ranks_whole_catalog() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;

        for recommender in models.values() {
            let ranked = recommender.rank(&[101, 102], None)?;
            let ids: BTreeSet<_> = ranked.iter().map(|s| s.track_id.clone()).collect();
            assert_eq!(ranked.len(), 5, "{} dropped tracks", recommender.kind());
            assert_eq!(ids.len(), 5, "{} duplicated tracks", recommender.kind());
            for pair in ranked.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
        Ok(())
    }

    #[test]
    fn test_rock_fan_gets_rock_first_by_popularity() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;

        // t2: 50 + 50 * 0.9 * 0.5 = 72.5, t5: 40 + 60 * 0.9 * 0.5 = 67, t3: 89.5
        let scored = get_playlist_with_scores(&models[&StrategyKind::Popularity], &[101], 3, None)?;
        let ids: Vec<_> = scored.iter().map(|s| s.track_id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t2", "t5"]);
        assert!((scored[1].score - 72.5).abs() < 1e-9);
        assert!((scored[2].score - 67.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_similarity_prefers_listened_tracks() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;

        // 102 only ever played and liked t4
        let ranked = models[&StrategyKind::Similarity].rank(&[102], None)?;
        assert_eq!(ranked[0].track_id, "t4");
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_repeated_requests_are_identical() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;
        let hybrid = &models[&StrategyKind::Hybrid];

        let first = get_playlist(hybrid, &[101, 102], 4, None)?;
        let _ = get_playlist(hybrid, &[101], 4, None)?;
        let second = get_playlist(hybrid, &[102, 101], 4, None)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_unknown_user_is_reported() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;

        let result = get_playlist(&models[&StrategyKind::Hybrid], &[101, 4242], 5, None);
        assert_eq!(result, Err(RecommendError::UnknownUser(4242)));
        Ok(())
    }

    #[test]
    fn test_user_without_weighted_events() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;

        // 103 only has an unweighted event
        assert!(matches!(
            get_playlist(&models[&StrategyKind::Similarity], &[103], 5, None),
            Err(RecommendError::UndefinedPreferenceVector { .. })
        ));
        assert_eq!(get_playlist(&models[&StrategyKind::Popularity], &[103], 5, None)?.len(), 5);
        assert_eq!(get_playlist(&models[&StrategyKind::Hybrid], &[101, 103], 5, None)?.len(), 5);
        Ok(())
    }

    #[test]
    fn test_candidate_restriction() -> Result<()> {
        let dir = create_test_dataset()?;
        let models = build(dir.path())?;
        let candidates = vec!["t1".to_string(), "t5".to_string()];

        for recommender in models.values() {
            let ids = get_playlist(recommender, &[101, 102], 10, Some(candidates.as_slice()))?;
            let set: BTreeSet<_> = ids.iter().cloned().collect();
            assert_eq!(set, candidates.iter().cloned().collect());
        }
        Ok(())
    }
}

#[cfg(test)]
mod feedback_tests {
    use super::*;
    use cadence::catalog::EventKind;
    use cadence::session_log::{self, FeedbackEntry};

    #[test]
    fn test_feedback_log_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let log = dir.path().join("log.jsonl");

        let session = session_log::next_session_id(&log, 60000)?;
        assert_eq!(session, 60000);

        session_log::append(
            &log,
            &[
                FeedbackEntry::now(session, 101, "t2".to_string(), EventKind::Like, StrategyKind::Hybrid),
                FeedbackEntry::now(session, 101, "t3".to_string(), EventKind::Skip, StrategyKind::Hybrid),
            ],
        )?;

        assert_eq!(session_log::next_session_id(&log, 60000)?, 60001);
        assert_eq!(session_log::read(&log)?.len(), 2);
        Ok(())
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;
    use cadence::catalog::EventKind;
    use cadence::get_playlist;
    use cadence::session_log;

    #[test]
    fn test_reactions_to_one_playlist_share_its_session() -> Result<()> {
        let dir = create_test_dataset()?;
        let log = dir.path().join("log.jsonl");
        let models = build(dir.path())?;
        let recommender = &models[&StrategyKind::Popularity];

        let tracks = get_playlist(recommender, &[101], 3, None)?;
        session_log::open_session(&log, 60000, recommender.kind(), &[101], &tracks)?;

        let kinds = [EventKind::Like, EventKind::Play, EventKind::Skip];
        for (track, kind) in tracks.iter().zip(kinds) {
            let session = session_log::current_session(&log)?.expect("open session");
            session_log::log_reaction(&log, &recommender.catalog().store, &session, 101, track.clone(), kind)?;
        }

        let entries = session_log::read(&log)?;
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.session_id == 60000));
        assert!(entries.iter().all(|e| e.model_type == StrategyKind::Popularity));

        // the next playlist starts the next session
        let next = session_log::open_session(&log, 60000, StrategyKind::Hybrid, &[101], &tracks)?;
        assert_eq!(next.session_id, 60001);
        Ok(())
    }

    #[test]
    fn test_reaction_to_unknown_track_is_rejected() -> Result<()> {
        let dir = create_test_dataset()?;
        let log = dir.path().join("log.jsonl");
        let models = build(dir.path())?;
        let recommender = &models[&StrategyKind::Hybrid];

        let session = session_log::open_session(&log, 60000, recommender.kind(), &[101], &[])?;
        let result = session_log::log_reaction(
            &log,
            &recommender.catalog().store,
            &session,
            101,
            "tlike".to_string(),
            EventKind::Like,
        );
        assert!(result.is_err());
        assert!(!log.exists());
        Ok(())
    }
}

#[cfg(test)]
mod configuration_tests {
    use cadence::config;

    #[test]
    fn test_data_directory_creation() -> anyhow::Result<()> {
        let data_dir = config::get_data_dir()?;

        assert!(data_dir.exists());
        assert!(data_dir.is_dir());
        assert!(data_dir.is_absolute());

        Ok(())
    }
}
