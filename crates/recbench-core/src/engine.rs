//! The completion-engine abstraction.
//!
//! An engine consumes a training rating matrix and returns a completed matrix
//! of the same shape with no missing markers. Recommendation is derived from
//! that completion, so every engine gets the same recommender behavior for
//! free.

use crate::{
    error::Result,
    recommend::{ranked_items, recommend_from_scores, Recommendation},
    types::RatingMatrix,
    validation::{ensure_non_empty, ensure_user},
};

/// A matrix-completion strategy.
pub trait CompletionEngine: Send + Sync {
    /// Short human-readable label, used in comparison tables and logs.
    fn name(&self) -> &str;

    /// Predicts every cell of `ratings`.
    ///
    /// The result has the shape of `ratings` and contains no missing marker.
    fn complete(&self, ratings: &RatingMatrix) -> Result<RatingMatrix>;

    /// Predicted scores of every item for one user.
    ///
    /// The default completes the whole matrix and extracts the row; engines
    /// that can predict a single user more cheaply override it.
    fn user_scores(&self, ratings: &RatingMatrix, user: usize) -> Result<Vec<f64>> {
        ensure_user(ratings, user)?;
        let completed = self.complete(ratings)?;
        Ok(completed.row(user).iter().copied().collect())
    }

    /// Recommends the single best item for `user`.
    ///
    /// Arguments are validated before any completion work is done.
    fn recommend(
        &self,
        ratings: &RatingMatrix,
        user: usize,
        novel_only: bool,
    ) -> Result<Recommendation> {
        ensure_non_empty(ratings)?;
        ensure_user(ratings, user)?;
        let scores = self.user_scores(ratings, user)?;
        recommend_from_scores(ratings, user, &scores, novel_only)
    }

    /// Recommends up to `n` items for `user`, best first.
    fn recommend_top_n(
        &self,
        ratings: &RatingMatrix,
        user: usize,
        n: usize,
        novel_only: bool,
    ) -> Result<Vec<usize>> {
        ensure_non_empty(ratings)?;
        ensure_user(ratings, user)?;
        let scores = self.user_scores(ratings, user)?;
        ranked_items(ratings, user, &scores, n, novel_only)
    }
}

/// Adapts a bare completion closure into a [`CompletionEngine`].
pub struct FnEngine<F> {
    label: String,
    complete: F,
}

impl<F> FnEngine<F>
where
    F: Fn(&RatingMatrix) -> Result<RatingMatrix> + Send + Sync,
{
    /// Wraps `complete` under `label`.
    pub fn new<S: Into<String>>(label: S, complete: F) -> Self {
        Self {
            label: label.into(),
            complete,
        }
    }
}

impl<F> std::fmt::Debug for FnEngine<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEngine").field("label", &self.label).finish()
    }
}

impl<F> CompletionEngine for FnEngine<F>
where
    F: Fn(&RatingMatrix) -> Result<RatingMatrix> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.label
    }

    fn complete(&self, ratings: &RatingMatrix) -> Result<RatingMatrix> {
        (self.complete)(ratings)
    }
}
