//! K-nearest-neighbor completion.
//!
//! One engine serves both orientations. In the user-based orientation a
//! missing `(u, j)` is predicted from the `k` users most similar to `u` among
//! those who rated `j`; in the item-based orientation from the `k` items most
//! similar to `j` among those `u` rated.
//!
//! The two orientations aggregate differently by default:
//!
//! - user-based is mean-centered:
//!   `mean(u) + sum(sim_p * (r_p - mean(p))) / sum(|sim_p|)`
//! - item-based is not: `sum(sim_p * r_p) / sum(|sim_p|)`
//!
//! This asymmetry is kept as the [`NeighborhoodConfig::mean_centered`] flag.
//! Whenever there are no neighbors, or all their similarities are zero, the
//! prediction falls back to the target user's own mean rating (0 for a user
//! with no rating). Observed cells are never re-predicted.

use recbench_core::{
    engine::CompletionEngine,
    error::Result,
    recommend::Recommendation,
    similarity::SimilarityCache,
    types::{Axis, RatingMatrix, Ratings},
    validation::{ensure_non_empty, ensure_positive, ensure_user},
};
use std::cmp::Ordering;
use tracing::trace;

/// Whose similarities drive the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Neighbors are users who rated the target item.
    UserBased,
    /// Neighbors are items the target user rated.
    ItemBased,
}

impl Orientation {
    /// The axis similarities are computed along.
    pub fn axis(self) -> Axis {
        match self {
            Self::UserBased => Axis::Users,
            Self::ItemBased => Axis::Items,
        }
    }
}

/// Configuration for the neighborhood engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeighborhoodConfig {
    /// Maximum number of neighbors per prediction
    pub k: usize,
    /// User-based or item-based neighborhoods
    pub orientation: Orientation,
    /// Aggregate deviations from neighbor means instead of raw ratings
    pub mean_centered: bool,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        Self::user_based(10)
    }
}

impl NeighborhoodConfig {
    /// User-based neighborhoods with mean-centering.
    pub fn user_based(k: usize) -> Self {
        Self {
            k,
            orientation: Orientation::UserBased,
            mean_centered: true,
        }
    }

    /// Item-based neighborhoods without mean-centering.
    pub fn item_based(k: usize) -> Self {
        Self {
            k,
            orientation: Orientation::ItemBased,
            mean_centered: false,
        }
    }

    /// Sets the neighbor count.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Overrides the orientation's default aggregation.
    pub fn with_mean_centering(mut self, mean_centered: bool) -> Self {
        self.mean_centered = mean_centered;
        self
    }

    /// Checks that the neighbor count is positive.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("k", self.k)
    }
}

/// Neighborhood completion engine.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    config: NeighborhoodConfig,
}

impl Neighborhood {
    /// Creates an engine from a configuration.
    pub fn new(config: NeighborhoodConfig) -> Self {
        Self { config }
    }

    /// User-based engine with `k` neighbors.
    pub fn user_based(k: usize) -> Self {
        Self::new(NeighborhoodConfig::user_based(k))
    }

    /// Item-based engine with `k` neighbors.
    pub fn item_based(k: usize) -> Self {
        Self::new(NeighborhoodConfig::item_based(k))
    }

    /// The engine configuration.
    pub fn config(&self) -> &NeighborhoodConfig {
        &self.config
    }
}

impl CompletionEngine for Neighborhood {
    fn name(&self) -> &str {
        match self.config.orientation {
            Orientation::UserBased => "knn-user",
            Orientation::ItemBased => "knn-item",
        }
    }

    fn complete(&self, ratings: &RatingMatrix) -> Result<RatingMatrix> {
        complete_neighborhood(ratings, &self.config)
    }

    fn user_scores(&self, ratings: &RatingMatrix, user: usize) -> Result<Vec<f64>> {
        ensure_non_empty(ratings)?;
        self.config.validate()?;
        ensure_user(ratings, user)?;

        let mut predictor = Predictor::new(ratings, &self.config);
        Ok(predictor.user_row(user))
    }
}

/// Completes every missing cell with a neighborhood prediction.
pub fn complete_neighborhood(
    ratings: &RatingMatrix,
    config: &NeighborhoodConfig,
) -> Result<RatingMatrix> {
    ensure_non_empty(ratings)?;
    config.validate()?;

    let mut predictor = Predictor::new(ratings, config);
    let mut completed = ratings.clone();
    for user in 0..ratings.nrows() {
        for (item, score) in predictor.user_row(user).into_iter().enumerate() {
            completed[(user, item)] = score;
        }
    }

    trace!(
        orientation = ?config.orientation,
        fallbacks = predictor.fallbacks,
        similarity_pairs = predictor.similarities.computed_pairs(),
        "neighborhood completion finished"
    );
    Ok(completed)
}

/// User-based completion, mean-centered.
pub fn complete_knn_user(ratings: &RatingMatrix, k: usize) -> Result<RatingMatrix> {
    complete_neighborhood(ratings, &NeighborhoodConfig::user_based(k))
}

/// Item-based completion, not mean-centered.
pub fn complete_knn_item(ratings: &RatingMatrix, k: usize) -> Result<RatingMatrix> {
    complete_neighborhood(ratings, &NeighborhoodConfig::item_based(k))
}

/// Best item for `user` under user-based prediction.
pub fn recommend_knn_user(
    ratings: &RatingMatrix,
    user: usize,
    novel_only: bool,
    k: usize,
) -> Result<Recommendation> {
    Neighborhood::user_based(k).recommend(ratings, user, novel_only)
}

/// Best item for `user` under item-based prediction.
pub fn recommend_knn_item(
    ratings: &RatingMatrix,
    user: usize,
    novel_only: bool,
    k: usize,
) -> Result<Recommendation> {
    Neighborhood::item_based(k).recommend(ratings, user, novel_only)
}

struct Neighbor {
    similarity: f64,
    rating: f64,
    mean: f64,
}

struct Predictor<'a> {
    ratings: &'a RatingMatrix,
    config: &'a NeighborhoodConfig,
    similarities: SimilarityCache<'a>,
    /// Means of the entities along the similarity axis.
    axis_means: Vec<Option<f64>>,
    /// Per-user fallback, 0 for users with no rating.
    user_fallbacks: Vec<f64>,
    fallbacks: usize,
}

impl<'a> Predictor<'a> {
    fn new(ratings: &'a RatingMatrix, config: &'a NeighborhoodConfig) -> Self {
        let axis = config.orientation.axis();
        let axis_means = (0..axis.len(ratings))
            .map(|index| match axis {
                Axis::Users => ratings.user_mean(index),
                Axis::Items => ratings.item_mean(index),
            })
            .collect();
        let user_fallbacks = (0..ratings.nrows())
            .map(|user| ratings.user_mean(user).unwrap_or(0.0))
            .collect();

        Self {
            ratings,
            config,
            similarities: SimilarityCache::new(ratings, axis),
            axis_means,
            user_fallbacks,
            fallbacks: 0,
        }
    }

    fn user_row(&mut self, user: usize) -> Vec<f64> {
        (0..self.ratings.ncols())
            .map(|item| {
                if self.ratings.is_rated(user, item) {
                    self.ratings[(user, item)]
                } else {
                    self.predict(user, item)
                }
            })
            .collect()
    }

    fn predict(&mut self, user: usize, item: usize) -> f64 {
        let (target, neighbors) = match self.config.orientation {
            Orientation::UserBased => (user, self.user_neighbors(user, item)),
            Orientation::ItemBased => (item, self.item_neighbors(user, item)),
        };

        let weight: f64 = neighbors.iter().map(|n| n.similarity.abs()).sum();
        if neighbors.is_empty() || weight == 0.0 {
            self.fallbacks += 1;
            return self.user_fallbacks[user];
        }

        if self.config.mean_centered {
            let base = self.axis_means[target].unwrap_or(0.0);
            let deviation: f64 = neighbors
                .iter()
                .map(|n| n.similarity * (n.rating - n.mean))
                .sum();
            base + deviation / weight
        } else {
            let weighted: f64 = neighbors.iter().map(|n| n.similarity * n.rating).sum();
            weighted / weight
        }
    }

    /// Users who rated `item`, ranked by similarity to `user`.
    fn user_neighbors(&mut self, user: usize, item: usize) -> Vec<Neighbor> {
        let ratings = self.ratings;
        let means = &self.axis_means;
        let similarities = &mut self.similarities;
        let candidates = ratings
            .observed_users(item)
            .into_iter()
            .filter(|&peer| peer != user)
            .map(|peer| Neighbor {
                similarity: similarities.get(user, peer),
                rating: ratings[(peer, item)],
                mean: means[peer].unwrap_or(0.0),
            })
            .collect();
        self.top_k(candidates)
    }

    /// Items `user` rated, ranked by similarity to `item`.
    fn item_neighbors(&mut self, user: usize, item: usize) -> Vec<Neighbor> {
        let ratings = self.ratings;
        let means = &self.axis_means;
        let similarities = &mut self.similarities;
        let candidates = ratings
            .observed_items(user)
            .into_iter()
            .filter(|&peer| peer != item)
            .map(|peer| Neighbor {
                similarity: similarities.get(item, peer),
                rating: ratings[(user, peer)],
                mean: means[peer].unwrap_or(0.0),
            })
            .collect();
        self.top_k(candidates)
    }

    fn top_k(&self, mut candidates: Vec<Neighbor>) -> Vec<Neighbor> {
        if candidates.len() > self.config.k {
            // Stable sort: equal similarities keep increasing index order.
            candidates.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(Ordering::Equal)
            });
            candidates.truncate(self.config.k);
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use recbench_core::{test_utils::sample_ratings, types::MISSING, RecError};

    #[test]
    fn test_user_based_prediction() {
        // Users 0 and 1 agree perfectly on items 0 and 1; user 2 disagrees.
        let m = RatingMatrix::from_row_slice(
            3,
            3,
            &[
                4.0, 2.0, MISSING, //
                2.0, 1.0, 3.0, //
                1.0, 4.0, 1.0,
            ],
        );
        let completed = complete_knn_user(&m, 1).unwrap();

        // Top-1 neighbor of user 0 is user 1 (cosine 1).
        let user0_mean = 3.0;
        let user1_mean = 2.0;
        assert_relative_eq!(completed[(0, 2)], user0_mean + (3.0 - user1_mean), epsilon = 1e-12);
        assert_eq!(completed[(1, 2)], 3.0);
    }

    #[test]
    fn test_user_based_uses_all_peers_when_fewer_than_k() {
        let m = RatingMatrix::from_row_slice(
            3,
            2,
            &[
                2.0, MISSING, //
                1.0, 3.0, //
                3.0, 1.0,
            ],
        );
        let completed = complete_knn_user(&m, 10).unwrap();

        // Single shared item: every cosine is 1.
        let expected = 2.0 + ((3.0 - 2.0) + (1.0 - 2.0)) / 2.0;
        assert_relative_eq!(completed[(0, 1)], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_item_based_is_not_mean_centered() {
        let m = RatingMatrix::from_row_slice(
            2,
            3,
            &[
                4.0, 2.0, MISSING, //
                2.0, 1.0, 5.0,
            ],
        );
        let completed = complete_knn_item(&m, 5).unwrap();

        // Item 2 shares only user 1 with items 0 and 1: both cosines are 1.
        assert_relative_eq!(completed[(0, 2)], (4.0 + 2.0) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_peer_prediction() {
        // User 0 is the only peer for item 1.
        let m = RatingMatrix::from_row_slice(2, 2, &[1.0, 5.0, 3.0, MISSING]);
        let completed = complete_knn_user(&m, 3).unwrap();
        assert_relative_eq!(completed[(1, 1)], 3.0 + (5.0 - 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_neighborhood_falls_back_to_user_mean() {
        // Nobody rated item 2.
        let m = RatingMatrix::from_row_slice(2, 3, &[2.0, 4.0, MISSING, 5.0, MISSING, MISSING]);
        let completed = complete_knn_user(&m, 3).unwrap();
        assert_relative_eq!(completed[(0, 2)], 3.0);
        assert_relative_eq!(completed[(1, 2)], 5.0);
    }

    #[test]
    fn test_zero_similarity_falls_back_to_user_mean() {
        // Users share no item, so the only peer has similarity 0.
        let isolated = RatingMatrix::from_row_slice(2, 2, &[1.0, MISSING, MISSING, 5.0]);
        let completed = complete_knn_user(&isolated, 3).unwrap();
        assert_eq!(completed[(0, 1)], 1.0);
        assert_eq!(completed[(1, 0)], 5.0);
    }

    #[test]
    fn test_tied_neighbors_keep_index_order() {
        // Users 1 and 2 both have cosine 1 with user 0; with k = 1 the lower index wins.
        let m = RatingMatrix::from_row_slice(
            3,
            3,
            &[3.0, 4.0, MISSING, 6.0, 8.0, 10.0, 3.0, 4.0, 2.0],
        );
        let completed = complete_knn_user(&m, 1).unwrap();
        assert_relative_eq!(completed[(0, 2)], 3.5 + (10.0 - 8.0), epsilon = 1e-12);

        let swapped = RatingMatrix::from_row_slice(
            3,
            3,
            &[3.0, 4.0, MISSING, 3.0, 4.0, 2.0, 6.0, 8.0, 10.0],
        );
        let completed = complete_knn_user(&swapped, 1).unwrap();
        assert_relative_eq!(completed[(0, 2)], 3.5 + (2.0 - 3.0), epsilon = 1e-12);

        // With k = 2 both peers contribute equally.
        let completed = complete_knn_user(&m, 2).unwrap();
        assert_relative_eq!(completed[(0, 2)], 3.5 + (2.0 - 1.0) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_user_without_ratings_falls_back_to_zero() {
        let m = RatingMatrix::from_row_slice(2, 2, &[MISSING, MISSING, 3.0, 4.0]);
        for completed in [complete_knn_user(&m, 2).unwrap(), complete_knn_item(&m, 2).unwrap()] {
            assert_eq!(completed[(0, 0)], 0.0);
            assert_eq!(completed[(0, 1)], 0.0);
        }
    }

    #[test]
    fn test_observed_cells_pass_through() {
        let m = sample_ratings();
        for completed in [complete_knn_user(&m, 2).unwrap(), complete_knn_item(&m, 2).unwrap()] {
            assert_eq!(completed.shape(), m.shape());
            for user in 0..3 {
                for item in 0..3 {
                    if m.is_rated(user, item) {
                        assert_eq!(completed[(user, item)], m[(user, item)]);
                    }
                    assert!(completed[(user, item)].is_finite());
                }
            }
        }
    }

    #[test]
    fn test_single_user_scores_match_full_completion() {
        let m = sample_ratings();
        for engine in [Neighborhood::user_based(2), Neighborhood::item_based(2)] {
            let completed = engine.complete(&m).unwrap();
            for user in 0..3 {
                let row = engine.user_scores(&m, user).unwrap();
                let expected: Vec<f64> = completed.row(user).iter().copied().collect();
                assert_eq!(row, expected);
            }
        }
    }

    #[test]
    fn test_configuration() {
        let config = NeighborhoodConfig::item_based(4).with_k(7).with_mean_centering(true);
        assert_eq!(config.k, 7);
        assert!(config.mean_centered);
        assert_eq!(config.orientation.axis(), Axis::Items);
        assert_eq!(Neighborhood::new(config).name(), "knn-item");
        assert_eq!(NeighborhoodConfig::default(), NeighborhoodConfig::user_based(10));

        assert!(matches!(
            complete_knn_user(&sample_ratings(), 0),
            Err(RecError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Neighborhood::user_based(2).recommend(&sample_ratings(), 3, true),
            Err(RecError::UserOutOfRange { .. })
        ));
    }
}
