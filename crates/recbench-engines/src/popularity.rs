//! Popularity baseline.
//!
//! Missing cells receive the mean rating of their item; items nobody rated
//! get 0. Observed cells are returned exactly as given, which makes this the
//! only engine whose completion reproduces its input wherever the input was
//! observed.

use recbench_core::{
    engine::CompletionEngine,
    error::Result,
    recommend::Recommendation,
    types::{is_observed, DVector, RatingMatrix, Ratings},
    validation::ensure_non_empty,
};

/// Per-item mean over observed ratings, 0 for items with no rating.
pub fn item_means(ratings: &RatingMatrix) -> DVector<f64> {
    DVector::from_fn(ratings.ncols(), |item, _| {
        ratings.item_mean(item).unwrap_or(0.0)
    })
}

/// Fills every missing cell with its item mean.
pub fn complete_popularity(ratings: &RatingMatrix) -> Result<RatingMatrix> {
    ensure_non_empty(ratings)?;

    let means = item_means(ratings);
    let mut completed = ratings.clone();
    for (item, mut column) in completed.column_iter_mut().enumerate() {
        for value in column.iter_mut().filter(|value| !is_observed(**value)) {
            *value = means[item];
        }
    }
    Ok(completed)
}

/// Recommends the most popular item for `user`.
pub fn recommend_popularity(
    ratings: &RatingMatrix,
    user: usize,
    novel_only: bool,
) -> Result<Recommendation> {
    Popularity.recommend(ratings, user, novel_only)
}

/// Item-mean completion engine.
#[derive(Debug, Clone, Default)]
pub struct Popularity;

impl Popularity {
    /// Creates the popularity baseline.
    pub fn new() -> Self {
        Self
    }
}

impl CompletionEngine for Popularity {
    fn name(&self) -> &str {
        "popularity"
    }

    fn complete(&self, ratings: &RatingMatrix) -> Result<RatingMatrix> {
        complete_popularity(ratings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use recbench_core::{
        recommend::Recommendation,
        test_utils::sample_ratings,
        types::{missing_matrix, MISSING},
        RecError,
    };

    #[test]
    fn test_scenario_fill() {
        let m = sample_ratings();
        let completed = complete_popularity(&m).unwrap();

        assert_relative_eq!(completed[(0, 2)], 3.0);
        assert_relative_eq!(completed[(1, 1)], 4.0);
        assert_relative_eq!(completed[(2, 0)], 4.5);

        for user in 0..3 {
            for item in 0..3 {
                if m.is_rated(user, item) {
                    assert_eq!(completed[(user, item)], m[(user, item)]);
                }
            }
        }
    }

    #[test]
    fn test_unrated_item_gets_zero() {
        let m = RatingMatrix::from_row_slice(2, 2, &[3.0, MISSING, 1.0, MISSING]);
        let completed = complete_popularity(&m).unwrap();
        assert_eq!(completed[(0, 1)], 0.0);
        assert_eq!(completed[(1, 1)], 0.0);
        assert_eq!(item_means(&missing_matrix(2, 3)).as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_recommend_picks_most_popular_unseen() {
        let m = sample_ratings();
        // User 0 has only item 2 left, mean 3.
        assert_eq!(
            Popularity::new().recommend(&m, 0, true).unwrap(),
            Recommendation::Item(2)
        );
        // Without the novelty filter user 0 keeps its own 5.
        assert_eq!(
            Popularity::new().recommend(&m, 0, false).unwrap(),
            Recommendation::Item(0)
        );
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        assert!(matches!(
            complete_popularity(&RatingMatrix::zeros(0, 3)),
            Err(RecError::EmptyMatrix { .. })
        ));
    }
}
