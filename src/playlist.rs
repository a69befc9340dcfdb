//! # Playlist Generation
//!
//! Ties the pieces together: a shared, immutable [`Catalog`] built once at
//! startup, and one [`Recommender`] per [`StrategyKind`] that turns a group of
//! users into an ordered track list.
//!
//! ```no_run
//! use cadence::{loader, playlist, algorithm::{ScoringContext, StrategyKind}};
//!
//! let data = loader::load_dataset(std::path::Path::new("data"))?;
//! let models = playlist::build_models(
//!     data.users, data.tracks, data.artists, data.events, ScoringContext::default(),
//! )?;
//! let tracks = playlist::get_playlist(&models[&StrategyKind::Hybrid], &[101, 102], 10, None)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::algorithm::{RequestState, ScoringContext, StrategyKind};
use crate::catalog::{
    ArtistRecord, Event, EventLog, TrackId, TrackRecord, UserId, UserRecord, UserTable,
};
use crate::error::{RecommendError, Result};
use crate::features::{FeatureStore, TrackEntry};
use crate::preference::{genre_profile_for, user_set, vector_for};
use crate::ranker::{rank_all, top_n};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Everything loaded once per process. Never mutated after construction.
#[derive(Debug)]
pub struct Catalog {
    pub store: FeatureStore,
    pub users: UserTable,
    pub events: EventLog,
    pub context: ScoringContext,
}

impl Catalog {
    pub fn build(
        users: Vec<UserRecord>,
        tracks: Vec<TrackRecord>,
        artists: Vec<ArtistRecord>,
        events: Vec<Event>,
        context: ScoringContext,
    ) -> Result<Self> {
        let store = FeatureStore::build(tracks, artists, context.normalization)?;
        let users = UserTable::new(users);
        let events = EventLog::new(events);
        info!(
            "Catalog ready: {} users, {} events",
            users.len(),
            events.len()
        );
        Ok(Self {
            store,
            users,
            events,
            context,
        })
    }

    /// Aggregate the request-scoped preference data a strategy needs.
    ///
    /// Every requested user is validated, whatever the strategy.
    pub fn prepare(&self, kind: StrategyKind, user_ids: &[UserId]) -> Result<RequestState> {
        let group = user_set(user_ids)?;
        if let Some(missing) = group.iter().find(|id| !self.users.contains(**id)) {
            return Err(RecommendError::UnknownUser(*missing));
        }

        let genre_profile = match kind.uses_genres() {
            true => Some(genre_profile_for(user_ids, &self.users)?),
            false => None,
        };
        let preference = match kind.uses_vector() {
            true => Some(vector_for(
                user_ids,
                &self.events,
                &self.store,
                self.context.zero_weight_policy,
            )?),
            false => None,
        };
        let genre_coefficient = self.context.group_coefficient(group.len());

        debug!(
            "Prepared {kind} request for {} users (genre coefficient {genre_coefficient})",
            group.len()
        );
        Ok(RequestState {
            genre_profile,
            preference,
            genre_coefficient,
        })
    }
}

/// A ranked track with its score, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTrack {
    pub track_id: TrackId,
    pub score: f64,
}

/// One strategy bound to the shared catalog. Cheap to clone, safe to share.
#[derive(Debug, Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    kind: StrategyKind,
}

impl Recommender {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, kind: StrategyKind) -> Self {
        Self { catalog, kind }
    }

    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        self.kind
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Score a single track for a group.
    pub fn score(&self, user_ids: &[UserId], track_id: &str) -> Result<f64> {
        let request = self.catalog.prepare(self.kind, user_ids)?;
        let track = self.catalog.store.track(track_id)?;
        self.kind
            .score(track, &self.catalog.store, &request, &self.catalog.context)
    }

    /// Rank the whole catalog, or only `candidates` when given.
    ///
    /// Restricted candidates are de-duplicated and tie-broken by catalog
    /// position, exactly like a full-catalog ranking.
    pub fn rank(
        &self,
        user_ids: &[UserId],
        candidates: Option<&[TrackId]>,
    ) -> Result<Vec<ScoredTrack>> {
        let request = self.catalog.prepare(self.kind, user_ids)?;
        let store = &self.catalog.store;

        let pool: Vec<&TrackEntry> = match candidates {
            None => store.tracks().iter().collect(),
            Some(ids) => restricted_pool(store, ids)?,
        };

        let ranked = rank_all(&pool, |track| {
            self.kind.score(track, store, &request, &self.catalog.context)
        })?;

        Ok(ranked
            .into_iter()
            .map(|(track, score)| ScoredTrack {
                track_id: track.id.clone(),
                score,
            })
            .collect())
    }
}

fn restricted_pool<'a>(store: &'a FeatureStore, ids: &[TrackId]) -> Result<Vec<&'a TrackEntry>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut positions = ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .map(|id| store.position(id))
        .collect::<Result<Vec<_>>>()?;
    positions.sort_unstable();
    Ok(positions.into_iter().map(|pos| &store.tracks()[pos]).collect())
}

/// Build the shared catalog and one ready recommender per strategy.
pub fn build_models(
    users: Vec<UserRecord>,
    tracks: Vec<TrackRecord>,
    artists: Vec<ArtistRecord>,
    events: Vec<Event>,
    context: ScoringContext,
) -> Result<BTreeMap<StrategyKind, Recommender>> {
    let catalog = Arc::new(Catalog::build(users, tracks, artists, events, context)?);
    Ok(StrategyKind::ALL
        .into_iter()
        .map(|kind| (kind, Recommender::new(Arc::clone(&catalog), kind)))
        .collect())
}

/// Ordered track ids, at most `size` long.
///
/// # Errors
///
/// [`RecommendError::InvalidPlaylistSize`] for `size == 0`, plus every error
/// [`Recommender::rank`] can return. Nothing partial is returned on failure.
pub fn get_playlist(
    recommender: &Recommender,
    user_ids: &[UserId],
    size: usize,
    candidates: Option<&[TrackId]>,
) -> Result<Vec<TrackId>> {
    Ok(get_playlist_with_scores(recommender, user_ids, size, candidates)?
        .into_iter()
        .map(|scored| scored.track_id)
        .collect())
}

/// Same as [`get_playlist`] but keeps the scores.
pub fn get_playlist_with_scores(
    recommender: &Recommender,
    user_ids: &[UserId],
    size: usize,
    candidates: Option<&[TrackId]>,
) -> Result<Vec<ScoredTrack>> {
    if size == 0 {
        return Err(RecommendError::InvalidPlaylistSize);
    }
    let ranked = recommender.rank(user_ids, candidates)?;
    Ok(top_n(ranked, size))
}

/// A/B arm for a logged-in user: ids above `split` get the similarity model,
/// the rest get the hybrid one.
#[must_use]
pub const fn ab_strategy(user_id: UserId, split: UserId) -> StrategyKind {
    match user_id > split {
        true => StrategyKind::Similarity,
        false => StrategyKind::Hybrid,
    }
}

/// `n` distinct catalog track ids picked at random (all of them when `n` is larger).
pub fn random_candidates<R: Rng + ?Sized>(store: &FeatureStore, n: usize, rng: &mut R) -> Vec<TrackId> {
    store
        .tracks()
        .choose_multiple(rng, n)
        .map(|track| track.id.clone())
        .collect()
}
