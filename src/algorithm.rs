//! Track scoring strategies for group recommendations.
//!
//! Three strategies share one capability, `score(track, request) -> f64`:
//!
//! - **Popularity**: raw popularity boosted by how many group members declared
//!   the track's genres
//! - **Similarity**: cosine similarity between the group preference vector and
//!   the track's feature vector
//! - **Hybrid**: scaled similarity plus the popularity score
//!
//! All tunables live in an immutable [`ScoringContext`]. The group-size
//! dampening of the genre coefficient is computed per request into a
//! [`RequestState`] and never written back into the context.

use crate::error::{RecommendError, Result};
use crate::features::{FeatureStore, Normalization, TrackEntry};
use crate::preference::{GenreProfile, PreferenceVector, ZeroWeightPolicy};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Immutable scoring parameters shared by every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringContext {
    /// Base genre boost before group-size dampening.
    pub genre_coefficient: f64,
    /// Multiplier bringing cosine similarity onto the 0-100 popularity scale.
    pub similarity_scale: f64,
    /// Subtracted from the genre match count, so zero matches is a mild penalty.
    pub genre_miss_offset: f64,
    pub zero_weight_policy: ZeroWeightPolicy,
    pub normalization: Normalization,
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self {
            genre_coefficient: 0.5,
            similarity_scale: 100.0,
            genre_miss_offset: 0.1,
            zero_weight_policy: ZeroWeightPolicy::Exclude,
            normalization: Normalization::L2,
        }
    }
}

impl ScoringContext {
    /// Genre coefficient for a group: larger groups lean more on raw popularity.
    #[must_use]
    pub fn group_coefficient(&self, group_size: usize) -> f64 {
        match group_size {
            0 => self.genre_coefficient,
            #[allow(clippy::cast_precision_loss)]
            n => self.genre_coefficient / n as f64,
        }
    }
}

/// Which recommendation strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Popularity,
    Similarity,
    Hybrid,
}

impl StrategyKind {
    pub const ALL: [Self; 3] = [Self::Popularity, Self::Similarity, Self::Hybrid];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::Similarity => "similarity",
            Self::Hybrid => "hybrid",
        }
    }

    #[must_use]
    pub const fn uses_genres(self) -> bool {
        matches!(self, Self::Popularity | Self::Hybrid)
    }

    #[must_use]
    pub const fn uses_vector(self) -> bool {
        matches!(self, Self::Similarity | Self::Hybrid)
    }

    /// Score one track for a prepared request.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures and [`RecommendError::ZeroNormVector`].
    pub fn score(
        self,
        track: &TrackEntry,
        store: &FeatureStore,
        request: &RequestState,
        context: &ScoringContext,
    ) -> Result<f64> {
        let score = match self {
            Self::Popularity => popularity_component(track, store, request, context)?,
            Self::Similarity => similarity_component(track, request, context)?,
            Self::Hybrid => {
                similarity_component(track, request, context)? * context.similarity_scale
                    + popularity_component(track, store, request, context)?
            }
        };
        trace!("{} score for `{}': {score:.4}", self.as_str(), track.id);
        Ok(score)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {s}. Use 'popularity', 'similarity' or 'hybrid'"))
    }
}

/// Per-request preference data, discarded after ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState {
    pub genre_profile: Option<GenreProfile>,
    pub preference: Option<PreferenceVector>,
    /// Genre coefficient already dampened by group size.
    pub genre_coefficient: f64,
}

/// `popularity + (100 - popularity) * match_level * coefficient`
#[must_use]
pub fn genre_popularity_score(popularity: u8, match_level: f64, coefficient: f64) -> f64 {
    let popularity = f64::from(popularity);
    popularity + (100.0 - popularity) * match_level * coefficient
}

/// Group genre matches for a track, minus the miss offset.
#[must_use]
pub fn genre_match_level(profile: &GenreProfile, genres: &BTreeSet<String>, offset: f64) -> f64 {
    f64::from(profile.matches(genres)) - offset
}

/// Cosine similarity; zero-norm inputs are an error rather than NaN.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RecommendError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(RecommendError::ZeroNormVector);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

fn popularity_component(
    track: &TrackEntry,
    store: &FeatureStore,
    request: &RequestState,
    context: &ScoringContext,
) -> Result<f64> {
    let profile = request
        .genre_profile
        .as_ref()
        .ok_or(RecommendError::MissingPreference("genre profile"))?;
    let genres = store.genres_of(&track.artist_id)?;
    let level = genre_match_level(profile, genres, context.genre_miss_offset);
    Ok(genre_popularity_score(track.popularity, level, request.genre_coefficient))
}

fn similarity_component(
    track: &TrackEntry,
    request: &RequestState,
    context: &ScoringContext,
) -> Result<f64> {
    let preference = request
        .preference
        .as_ref()
        .ok_or(RecommendError::MissingPreference("preference vector"))?;
    if context.zero_weight_policy == ZeroWeightPolicy::Neutral && preference.is_zero() {
        return Ok(0.0);
    }
    cosine_similarity(&preference.values, &track.features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{artist, track, user};
    use crate::catalog::UserTable;
    use crate::preference::genre_profile_for;

    #[test]
    fn test_genre_popularity_worked_example() {
        // popularity [10, 50, 90], matches [0, 1, 0], coefficient 0.5
        let scores: Vec<f64> = [(10, 0.0), (50, 1.0), (90, 0.0)]
            .iter()
            .map(|&(pop, matches)| genre_popularity_score(pop, matches - 0.1, 0.5))
            .collect();
        let expected = [5.5, 72.5, 89.5];
        for (score, want) in scores.iter().zip(expected) {
            assert!((score - want).abs() < 1e-9, "{score} != {want}");
        }
    }

    #[test]
    fn test_genre_popularity_monotonic_in_match_level() {
        for popularity in [0, 25, 50, 99, 100] {
            let mut previous = f64::NEG_INFINITY;
            for level in [-0.1, 0.9, 1.9, 2.9, 10.0] {
                let score = genre_popularity_score(popularity, level, 0.25);
                assert!(score >= previous);
                previous = score;
            }
        }
    }

    #[test]
    fn test_zero_matches_penalize_below_raw_popularity() {
        assert!(genre_popularity_score(40, -0.1, 0.5) < 40.0);
        assert_eq!(genre_popularity_score(100, -0.1, 0.5), 100.0);
    }

    #[test]
    fn test_cosine_similarity_properties() {
        let a = [1.0, 2.0, 3.0];
        let b = [-2.0, 0.5, 4.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), cosine_similarity(&b, &a).unwrap());
        assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_rejects_degenerate_input() {
        assert_eq!(
            cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]),
            Err(RecommendError::ZeroNormVector)
        );
        assert_eq!(
            cosine_similarity(&[1.0], &[1.0, 1.0]),
            Err(RecommendError::DimensionMismatch { expected: 1, actual: 2 })
        );
    }

    #[test]
    fn test_group_coefficient_dampening() {
        let context = ScoringContext::default();
        assert_eq!(context.group_coefficient(1), 0.5);
        assert_eq!(context.group_coefficient(4), 0.125);
        // context itself is untouched
        assert_eq!(context.genre_coefficient, 0.5);
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
        assert!("random".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_hybrid_is_scaled_similarity_plus_popularity() {
        let store = FeatureStore::build(
            vec![
                track("t1", "a1", 30, [1.0, 0.5, 0.0, -3.0, 0.1, 0.2, 0.0, 0.3, 0.4, 100.0]),
                track("t2", "a2", 70, [0.2, 0.9, 5.0, -9.0, 0.3, 0.1, 0.6, 0.1, 0.8, 140.0]),
            ],
            vec![artist("a1", &["rock"]), artist("a2", &["pop"])],
            Normalization::L2,
        )
        .unwrap();
        let users = UserTable::new(vec![user(1, &["rock"])]);
        let context = ScoringContext::default();
        let request = RequestState {
            genre_profile: Some(genre_profile_for(&[1], &users).unwrap()),
            preference: Some(PreferenceVector {
                values: store.vector_of("t2").unwrap().to_vec(),
                excluded: vec![],
            }),
            genre_coefficient: context.group_coefficient(1),
        };

        let track = store.track("t1").unwrap();
        let popularity = StrategyKind::Popularity.score(track, &store, &request, &context).unwrap();
        let similarity = StrategyKind::Similarity.score(track, &store, &request, &context).unwrap();
        let hybrid = StrategyKind::Hybrid.score(track, &store, &request, &context).unwrap();

        assert!((popularity - (30.0 + 70.0 * 0.9 * 0.5)).abs() < 1e-9);
        assert!((hybrid - (similarity * 100.0 + popularity)).abs() < 1e-9);

        let own = StrategyKind::Similarity
            .score(store.track("t2").unwrap(), &store, &request, &context)
            .unwrap();
        assert!((own - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_zero_vector_scores_zero() {
        let store = FeatureStore::build(
            vec![track("t1", "a1", 30, [1.0; 10])],
            vec![artist("a1", &[])],
            Normalization::L2,
        )
        .unwrap();
        let mut request = RequestState {
            genre_profile: None,
            preference: Some(PreferenceVector {
                values: vec![0.0; store.dimension()],
                excluded: vec![],
            }),
            genre_coefficient: 0.5,
        };
        let track = store.track("t1").unwrap();

        let neutral = ScoringContext {
            zero_weight_policy: ZeroWeightPolicy::Neutral,
            ..ScoringContext::default()
        };
        assert_eq!(StrategyKind::Similarity.score(track, &store, &request, &neutral).unwrap(), 0.0);

        let strict = ScoringContext::default();
        assert_eq!(
            StrategyKind::Similarity.score(track, &store, &request, &strict),
            Err(RecommendError::ZeroNormVector)
        );

        request.preference = None;
        assert_eq!(
            StrategyKind::Similarity.score(track, &store, &request, &strict),
            Err(RecommendError::MissingPreference("preference vector"))
        );
    }
}
