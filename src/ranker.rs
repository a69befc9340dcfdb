//! Ordering of scored candidates.
//!
//! Scores are computed in parallel; ordering happens afterwards with a stable
//! sort, so ties keep their input order and repeated calls give identical
//! output.

use rayon::prelude::*;
use std::cmp::Ordering;

/// Score every candidate and sort descending by score.
///
/// Candidates with equal scores stay in input order. Pass candidates in
/// catalog order to break ties by catalog position.
///
/// # Errors
///
/// Any scoring error aborts the ranking; no partial list is returned.
pub fn rank_all<T, E, F>(candidates: &[T], score_fn: F) -> Result<Vec<(T, f64)>, E>
where
    T: Clone + Send + Sync,
    E: Send,
    F: Fn(&T) -> Result<f64, E> + Sync,
{
    let mut ranked = candidates
        .par_iter()
        .map(|candidate| score_fn(candidate).map(|score| (candidate.clone(), score)))
        .collect::<Result<Vec<_>, E>>()?;

    ranked.sort_by(|(_, a), (_, b)| descending(*a, *b));
    Ok(ranked)
}

/// First `n` entries; fewer when fewer exist.
#[must_use]
pub fn top_n<T>(mut ranked: Vec<T>, n: usize) -> Vec<T> {
    ranked.truncate(n);
    ranked
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
