//! # Preference Aggregator
//!
//! Turns a group of users into the two request-scoped structures the scoring
//! strategies consume:
//!
//! - a [`PreferenceVector`]: weighted average of listened track vectors per
//!   user (play 1, like 2, skip -1, anything else 0), then a uniform average
//!   across users
//! - a [`GenreProfile`]: how many users in the group declared each genre
//!
//! Both are built fresh for every request and never cached.

use crate::catalog::{EventLog, UserId, UserTable};
use crate::error::{RecommendError, Result};
use crate::features::FeatureStore;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What to do with a user whose events sum to zero total weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroWeightPolicy {
    /// Leave the user out of vector averaging; genres still count.
    #[default]
    Exclude,
    /// Count the user as a zero vector; a zero group vector scores 0.
    Neutral,
    /// Fail the request.
    Fail,
}

/// Group listening taste in feature space.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceVector {
    pub values: Vec<f64>,
    /// Users left out under [`ZeroWeightPolicy::Exclude`].
    pub excluded: Vec<UserId>,
}

impl PreferenceVector {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

/// Declared-genre occurrence counts for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreProfile {
    counts: BTreeMap<String, u32>,
}

impl GenreProfile {
    #[must_use]
    pub fn count(&self, genre: &str) -> u32 {
        self.counts.get(genre).copied().unwrap_or(0)
    }

    /// Sum of group counts over `genres`.
    #[must_use]
    pub fn matches(&self, genres: &BTreeSet<String>) -> u32 {
        genres.iter().map(|genre| self.count(genre)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Collapse a request's user list into a set.
pub fn user_set(user_ids: &[UserId]) -> Result<BTreeSet<UserId>> {
    let set: BTreeSet<UserId> = user_ids.iter().copied().collect();
    if set.is_empty() {
        return Err(RecommendError::EmptyUserSet);
    }
    Ok(set)
}

/// Count each declared genre once per user.
///
/// # Errors
///
/// [`RecommendError::UnknownUser`] for an id missing from `users`,
/// [`RecommendError::EmptyUserSet`] for an empty request.
pub fn genre_profile_for(user_ids: &[UserId], users: &UserTable) -> Result<GenreProfile> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for user_id in user_set(user_ids)? {
        for genre in &users.get(user_id)?.favourite_genres {
            *counts.entry(genre.clone()).or_insert(0) += 1;
        }
    }
    Ok(GenreProfile { counts })
}

/// Build the group preference vector.
///
/// # Errors
///
/// - [`RecommendError::UnknownTrack`] when an event references a track outside the catalog
/// - [`RecommendError::UndefinedPreferenceVector`] when the policy cannot produce a vector
pub fn vector_for(
    user_ids: &[UserId],
    events: &EventLog,
    store: &FeatureStore,
    policy: ZeroWeightPolicy,
) -> Result<PreferenceVector> {
    let users = user_set(user_ids)?;
    let dim = store.dimension();

    let mut per_user = Vec::with_capacity(users.len());
    let mut excluded = Vec::new();
    for user_id in users {
        match user_vector(user_id, events, store)? {
            Some(vector) => per_user.push(vector),
            None => match policy {
                ZeroWeightPolicy::Exclude => excluded.push(user_id),
                ZeroWeightPolicy::Neutral => per_user.push(vec![0.0; dim]),
                ZeroWeightPolicy::Fail => {
                    return Err(RecommendError::UndefinedPreferenceVector {
                        users: vec![user_id],
                    })
                }
            },
        }
    }

    if !excluded.is_empty() {
        debug!("Users {excluded:?} excluded from vector aggregation (zero event weight)");
    }

    let values = uniform_average(&per_user, dim)?.ok_or_else(|| {
        RecommendError::UndefinedPreferenceVector {
            users: excluded.clone(),
        }
    })?;

    Ok(PreferenceVector { values, excluded })
}

/// Weighted average of one user's listened tracks; `None` at zero total weight.
pub fn user_vector(
    user_id: UserId,
    events: &EventLog,
    store: &FeatureStore,
) -> Result<Option<Vec<f64>>> {
    let weighted = events
        .for_user(user_id)
        .iter()
        .map(|event| {
            store
                .vector_of(&event.track_id)
                .map(|vector| (vector, event.kind.weight()))
        })
        .collect::<Result<Vec<_>>>()?;

    trace!("User {user_id}: {} weighted events", weighted.len());
    weighted_average(weighted, store.dimension())
}

/// `sum(w * v) / sum(w)`; `None` when the weights sum to zero.
pub fn weighted_average<'a>(
    items: impl IntoIterator<Item = (&'a [f64], f64)>,
    dim: usize,
) -> Result<Option<Vec<f64>>> {
    let mut sum = vec![0.0; dim];
    let mut total_weight = 0.0;

    for (vector, weight) in items {
        if vector.len() != dim {
            return Err(RecommendError::DimensionMismatch {
                expected: dim,
                actual: vector.len(),
            });
        }
        total_weight += weight;
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += weight * value;
        }
    }

    if total_weight == 0.0 {
        return Ok(None);
    }
    Ok(Some(sum.into_iter().map(|v| v / total_weight).collect()))
}

/// Equal-weight mean of per-user vectors; `None` for no vectors.
pub fn uniform_average(vectors: &[Vec<f64>], dim: usize) -> Result<Option<Vec<f64>>> {
    weighted_average(vectors.iter().map(|v| (v.as_slice(), 1.0)), dim)
}
