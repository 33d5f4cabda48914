//! Turning predicted scores into a recommendation.
//!
//! Every engine reports the "nothing left to recommend" situation through the
//! same [`Recommendation::NoEligibleItem`] outcome, never through an arbitrary
//! index or an empty collection.

use crate::{
    error::{RecError, Result},
    types::{RatingMatrix, Ratings},
    validation::{ensure_non_empty, ensure_positive, ensure_same_shape, ensure_user},
};
use std::cmp::Ordering;

/// Outcome of asking for a single recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Recommendation {
    /// The recommended item index.
    Item(usize),
    /// Novel items were requested but the user has already rated every item.
    NoEligibleItem,
}

impl Recommendation {
    /// The recommended item, if any.
    pub fn item(self) -> Option<usize> {
        match self {
            Self::Item(item) => Some(item),
            Self::NoEligibleItem => None,
        }
    }

    /// Whether no item was eligible.
    pub fn is_none(self) -> bool {
        matches!(self, Self::NoEligibleItem)
    }
}

impl From<Recommendation> for Option<usize> {
    fn from(recommendation: Recommendation) -> Self {
        recommendation.item()
    }
}

/// Picks the best-scored item for `user` from a dense completion.
///
/// With `novel_only`, items the user rated in `train` are never chosen. Ties
/// go to the lowest item index.
pub fn recommend_from_completion(
    train: &RatingMatrix,
    completed: &RatingMatrix,
    user: usize,
    novel_only: bool,
) -> Result<Recommendation> {
    ensure_non_empty(train)?;
    ensure_same_shape(train, completed)?;
    ensure_user(train, user)?;

    let scores: Vec<f64> = completed.row(user).iter().copied().collect();
    recommend_from_scores(train, user, &scores, novel_only)
}

/// Picks the best-scored item for `user` given one predicted score per item.
pub fn recommend_from_scores(
    train: &RatingMatrix,
    user: usize,
    scores: &[f64],
    novel_only: bool,
) -> Result<Recommendation> {
    let candidates = eligible(train, user, scores, novel_only)?;

    let best = candidates
        .into_iter()
        .fold(None, |best: Option<(usize, f64)>, (item, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((item, score)),
        });

    Ok(best.map_or(Recommendation::NoEligibleItem, |(item, _)| {
        Recommendation::Item(item)
    }))
}

/// Up to `n` eligible items for `user`, best predicted score first.
///
/// Ties keep increasing item order. An empty vector means no item is eligible.
pub fn ranked_items(
    train: &RatingMatrix,
    user: usize,
    scores: &[f64],
    n: usize,
    novel_only: bool,
) -> Result<Vec<usize>> {
    ensure_positive("n", n)?;
    let mut candidates = eligible(train, user, scores, novel_only)?;

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    candidates.truncate(n);

    Ok(candidates.into_iter().map(|(item, _)| item).collect())
}

fn eligible(
    train: &RatingMatrix,
    user: usize,
    scores: &[f64],
    novel_only: bool,
) -> Result<Vec<(usize, f64)>> {
    ensure_user(train, user)?;
    if scores.len() != train.ncols() {
        return Err(RecError::dimension_mismatch(
            format!("{} scores", train.ncols()),
            format!("{} scores", scores.len()),
        ));
    }

    Ok(scores
        .iter()
        .enumerate()
        .filter(|&(item, _)| !novel_only || !train.is_rated(user, item))
        .map(|(item, &score)| {
            // An undefined prediction ranks below every defined one.
            let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
            (item, score)
        })
        .collect())
}
