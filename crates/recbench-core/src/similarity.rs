//! Cosine similarity under missing data.
//!
//! Two users (or two items) are compared only on the positions where both
//! carry an observed rating. An empty shared support, or a shared support on
//! which either vector is identically zero, yields a similarity of 0.

use crate::types::{is_observed, Axis, DMatrix, RatingMatrix};

/// Cosine similarity between vectors `a` and `b` along `axis`, restricted to
/// their co-observed positions.
///
/// `Axis::Users` compares rows `a` and `b`, `Axis::Items` compares columns.
/// The result is symmetric in `a` and `b` and lies in `[-1, 1]`.
///
/// # Example
/// ```
/// use recbench_core::{similarity::cosine_similarity, types::{Axis, RatingMatrix, MISSING}};
///
/// let m = RatingMatrix::from_row_slice(2, 3, &[1.0, 2.0, MISSING, 2.0, 4.0, 1.0]);
/// assert!((cosine_similarity(&m, 0, 1, Axis::Users) - 1.0).abs() < 1e-12);
/// ```
pub fn cosine_similarity(ratings: &RatingMatrix, a: usize, b: usize, axis: Axis) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    let mut shared = 0usize;

    for position in 0..axis.span(ratings) {
        let x = axis.value(ratings, a, position);
        let y = axis.value(ratings, b, position);
        if is_observed(x) && is_observed(y) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
            shared += 1;
        }
    }

    if shared == 0 {
        return 0.0;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    (dot / denominator).clamp(-1.0, 1.0)
}

/// Lazily filled, symmetric table of pairwise similarities along one axis.
///
/// Each pair is computed at most once per cache. Neighborhood predictions ask
/// for the same pairs many times while completing a matrix.
#[derive(Debug, Clone)]
pub struct SimilarityCache<'a> {
    ratings: &'a RatingMatrix,
    axis: Axis,
    values: DMatrix<f64>,
    computed: usize,
}

impl<'a> SimilarityCache<'a> {
    /// Creates an empty cache over `ratings` along `axis`.
    pub fn new(ratings: &'a RatingMatrix, axis: Axis) -> Self {
        let n = axis.len(ratings);
        Self {
            ratings,
            axis,
            values: DMatrix::from_element(n, n, f64::NAN),
            computed: 0,
        }
    }

    /// Similarity between `a` and `b`, computing and storing it on first use.
    pub fn get(&mut self, a: usize, b: usize) -> f64 {
        let cached = self.values[(a, b)];
        if !cached.is_nan() {
            return cached;
        }

        let value = cosine_similarity(self.ratings, a, b, self.axis);
        self.values[(a, b)] = value;
        self.values[(b, a)] = value;
        self.computed += 1;
        value
    }

    /// Axis the cache compares along.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Number of distinct pairs computed so far.
    pub fn computed_pairs(&self) -> usize {
        self.computed
    }
}
