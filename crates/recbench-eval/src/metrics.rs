//! Scoring a completion against a reference matrix.
//!
//! Every metric is defined over the cells observed in `truth` only. A metric
//! with nothing to average over (no observed truth cell, no user with a
//! defined per-user value) returns NaN rather than an error; errors are
//! reserved for invalid arguments such as mismatched shapes.
//!
//! Precision and recall treat a truth rating `> 0` as relevant. That suits
//! centered or implicit-feedback scales; on a 1-5 star scale every observed
//! rating counts as relevant.

use recbench_core::{
    error::Result,
    types::{is_observed, RatingMatrix},
    validation::{ensure_positive, ensure_same_shape},
};
use std::cmp::Ordering;

/// Root mean squared error over the observed truth cells.
///
/// A NaN or infinite prediction at an observed truth cell makes the result
/// non-finite.
pub fn rmse(completed: &RatingMatrix, truth: &RatingMatrix) -> Result<f64> {
    ensure_same_shape(truth, completed)?;
    Ok(mean(observed_pairs(completed, truth).map(|(p, t)| (p - t) * (p - t))).sqrt())
}

/// Mean absolute error over the observed truth cells.
pub fn mae(completed: &RatingMatrix, truth: &RatingMatrix) -> Result<f64> {
    ensure_same_shape(truth, completed)?;
    Ok(mean(observed_pairs(completed, truth).map(|(p, t)| (p - t).abs())))
}

/// Fraction of each user's `k` best-predicted items that are relevant in `truth`, averaged.
///
/// Users with no observed truth cell are skipped.
pub fn precision_at_k(completed: &RatingMatrix, truth: &RatingMatrix, k: usize) -> Result<f64> {
    ensure_same_shape(truth, completed)?;
    ensure_positive("k", k)?;

    Ok(mean((0..truth.nrows()).filter_map(|user| {
        if !truth.row(user).iter().any(|v| is_observed(*v)) {
            return None;
        }
        let top = top_k(completed, user, k);
        let hits = top.iter().filter(|&&item| truth[(user, item)] > 0.0).count();
        Some(hits as f64 / top.len() as f64)
    })))
}

/// Fraction of each user's relevant truth items found among their `k` best predictions, averaged.
///
/// Users with no relevant truth item are skipped.
pub fn recall_at_k(completed: &RatingMatrix, truth: &RatingMatrix, k: usize) -> Result<f64> {
    ensure_same_shape(truth, completed)?;
    ensure_positive("k", k)?;

    Ok(mean((0..truth.nrows()).filter_map(|user| {
        let relevant = truth.row(user).iter().filter(|&&v| v > 0.0).count();
        if relevant == 0 {
            return None;
        }
        let top = top_k(completed, user, k);
        let hits = top.iter().filter(|&&item| truth[(user, item)] > 0.0).count();
        Some(hits as f64 / relevant as f64)
    })))
}

/// Fraction of users with at least one prediction in `completed`.
pub fn user_coverage(completed: &RatingMatrix, truth: &RatingMatrix) -> Result<f64> {
    ensure_same_shape(truth, completed)?;
    let covered = completed
        .row_iter()
        .filter(|row| row.iter().any(|v| is_observed(*v)))
        .count();
    Ok(covered as f64 / completed.nrows() as f64)
}

/// Fraction of items with at least one prediction in `completed`.
pub fn item_coverage(completed: &RatingMatrix, truth: &RatingMatrix) -> Result<f64> {
    ensure_same_shape(truth, completed)?;
    let covered = completed
        .column_iter()
        .filter(|column| column.iter().any(|v| is_observed(*v)))
        .count();
    Ok(covered as f64 / completed.ncols() as f64)
}

/// Spearman correlation between predicted and true orderings, averaged over users.
///
/// For each user only items observed in `truth` with a finite prediction take
/// part. Users with fewer than two such items, or whose ranks have no
/// variance, are skipped.
pub fn rank_correlation(completed: &RatingMatrix, truth: &RatingMatrix) -> Result<f64> {
    ensure_same_shape(truth, completed)?;

    Ok(mean((0..truth.nrows()).filter_map(|user| {
        let (predicted, actual): (Vec<f64>, Vec<f64>) = (0..truth.ncols())
            .filter(|&item| is_observed(truth[(user, item)]) && completed[(user, item)].is_finite())
            .map(|item| (completed[(user, item)], truth[(user, item)]))
            .unzip();
        spearman(&predicted, &actual)
    })))
}

/// A named scoring function usable with [`compare`](crate::compare::compare).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// [`rmse`]
    Rmse,
    /// [`mae`]
    Mae,
    /// [`precision_at_k`] with the given cutoff
    PrecisionAt(usize),
    /// [`recall_at_k`] with the given cutoff
    RecallAt(usize),
    /// [`user_coverage`]
    UserCoverage,
    /// [`item_coverage`]
    ItemCoverage,
    /// [`rank_correlation`]
    RankCorrelation,
}

impl Metric {
    /// Scores `completed` against `truth`.
    pub fn score(self, completed: &RatingMatrix, truth: &RatingMatrix) -> Result<f64> {
        match self {
            Self::Rmse => rmse(completed, truth),
            Self::Mae => mae(completed, truth),
            Self::PrecisionAt(k) => precision_at_k(completed, truth, k),
            Self::RecallAt(k) => recall_at_k(completed, truth, k),
            Self::UserCoverage => user_coverage(completed, truth),
            Self::ItemCoverage => item_coverage(completed, truth),
            Self::RankCorrelation => rank_correlation(completed, truth),
        }
    }

    /// Whether smaller values mean better completions.
    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::Rmse | Self::Mae)
    }
}

fn observed_pairs<'a>(
    completed: &'a RatingMatrix,
    truth: &'a RatingMatrix,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    completed
        .iter()
        .zip(truth.iter())
        .filter(|(_, t)| is_observed(**t))
        .map(|(p, t)| (*p, *t))
}

/// Items of `user` ordered by predicted score, best first; NaN predictions last.
fn top_k(completed: &RatingMatrix, user: usize, k: usize) -> Vec<usize> {
    let mut items: Vec<(usize, f64)> = completed
        .row(user)
        .iter()
        .map(|&v| if v.is_nan() { f64::NEG_INFINITY } else { v })
        .enumerate()
        .collect();
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    items.truncate(k);
    items.into_iter().map(|(item, _)| item).collect()
}

/// Mean of every value, NaN when there are none.
///
/// Non-finite values propagate, so a NaN or infinite prediction at an
/// observed cell poisons the error instead of being skipped.
fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let rx = average_ranks(x);
    let ry = average_ranks(y);

    let mean_x = rx.iter().sum::<f64>() / n as f64;
    let mean_y = ry.iter().sum::<f64>() / n as f64;

    let (mut num, mut den_x, mut den_y) = (0.0, 0.0, 0.0);
    for (a, b) in rx.iter().zip(&ry) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x == 0.0 || den_y == 0.0 {
        None
    } else {
        Some(num / (den_x.sqrt() * den_y.sqrt()))
    }
}

/// Zero-based ranks, tied values sharing their average rank.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end - 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use recbench_core::{
        test_utils::sample_ratings,
        types::{missing_matrix, MISSING},
        RecError,
    };

    #[test]
    fn test_errors_against_self_are_zero() {
        let m = sample_ratings();
        assert_eq!(rmse(&m, &m).unwrap(), 0.0);
        assert_eq!(mae(&m, &m).unwrap(), 0.0);
    }

    #[test]
    fn test_rmse_and_mae() {
        let truth = RatingMatrix::from_row_slice(1, 3, &[1.0, MISSING, 3.0]);
        let completed = RatingMatrix::from_row_slice(1, 3, &[2.0, 100.0, 6.0]);
        assert_relative_eq!(rmse(&completed, &truth).unwrap(), (5.0f64).sqrt());
        assert_relative_eq!(mae(&completed, &truth).unwrap(), 2.0);
    }

    #[test]
    fn test_non_finite_predictions_are_not_skipped() {
        let truth = RatingMatrix::from_row_slice(1, 3, &[1.0, 2.0, 5.0]);

        let with_nan = RatingMatrix::from_row_slice(1, 3, &[MISSING, 2.0, 5.0]);
        assert!(rmse(&with_nan, &truth).unwrap().is_nan());
        assert!(mae(&with_nan, &truth).unwrap().is_nan());

        let with_inf = RatingMatrix::from_row_slice(1, 3, &[1.0, 2.0, f64::INFINITY]);
        assert_eq!(rmse(&with_inf, &truth).unwrap(), f64::INFINITY);
        assert_eq!(mae(&with_inf, &truth).unwrap(), f64::INFINITY);

        let both = RatingMatrix::from_row_slice(1, 3, &[MISSING, 2.0, f64::INFINITY]);
        assert!(!rmse(&both, &truth).unwrap().is_finite());

        // Predictions at unobserved truth cells still do not count.
        let sparse_truth = RatingMatrix::from_row_slice(1, 3, &[MISSING, 2.0, MISSING]);
        assert_eq!(rmse(&both, &sparse_truth).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_truth_is_nan() {
        let truth = missing_matrix(2, 2);
        let completed = RatingMatrix::zeros(2, 2);
        assert!(rmse(&completed, &truth).unwrap().is_nan());
        assert!(precision_at_k(&completed, &truth, 1).unwrap().is_nan());
        assert!(rank_correlation(&completed, &truth).unwrap().is_nan());
    }

    #[test]
    fn test_precision_and_recall() {
        // User 0: relevant items 0 and 3; predictions rank 3, 1, 0, 2.
        let truth = RatingMatrix::from_row_slice(
            2,
            4,
            &[1.0, -1.0, MISSING, 1.0, MISSING, MISSING, MISSING, MISSING],
        );
        let completed = RatingMatrix::from_row_slice(
            2,
            4,
            &[2.0, 3.0, 1.0, 4.0, 0.0, 0.0, 0.0, 0.0],
        );

        assert_relative_eq!(precision_at_k(&completed, &truth, 2).unwrap(), 0.5);
        assert_relative_eq!(recall_at_k(&completed, &truth, 2).unwrap(), 0.5);
        assert_relative_eq!(precision_at_k(&completed, &truth, 3).unwrap(), 2.0 / 3.0);
        assert_relative_eq!(recall_at_k(&completed, &truth, 3).unwrap(), 1.0);
        // k beyond the item count uses every item.
        assert_relative_eq!(precision_at_k(&completed, &truth, 10).unwrap(), 0.5);
        assert!(matches!(
            precision_at_k(&completed, &truth, 0),
            Err(RecError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_coverage() {
        let completed = RatingMatrix::from_row_slice(2, 3, &[1.0, MISSING, MISSING, MISSING, MISSING, MISSING]);
        let truth = missing_matrix(2, 3);
        assert_relative_eq!(user_coverage(&completed, &truth).unwrap(), 0.5);
        assert_relative_eq!(item_coverage(&completed, &truth).unwrap(), 1.0 / 3.0);
        assert_relative_eq!(user_coverage(&RatingMatrix::zeros(2, 3), &truth).unwrap(), 1.0);
    }

    #[test]
    fn test_rank_correlation() {
        let truth = RatingMatrix::from_row_slice(2, 4, &[1.0, 2.0, 3.0, 4.0, 4.0, 3.0, 2.0, MISSING]);
        let perfect = RatingMatrix::from_row_slice(2, 4, &[10.0, 20.0, 30.0, 40.0, 9.0, 8.0, 7.0, 0.0]);
        assert_relative_eq!(rank_correlation(&perfect, &truth).unwrap(), 1.0, epsilon = 1e-12);

        let reversed = perfect.map(|v| -v);
        assert_relative_eq!(rank_correlation(&reversed, &truth).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[3.0, 1.0, 3.0, 2.0]), vec![2.5, 0.0, 2.5, 1.0]);
        assert_eq!(spearman(&[1.0, 1.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = RatingMatrix::zeros(2, 2);
        let b = RatingMatrix::zeros(2, 3);
        for metric in [
            Metric::Rmse,
            Metric::Mae,
            Metric::PrecisionAt(1),
            Metric::RecallAt(1),
            Metric::UserCoverage,
            Metric::ItemCoverage,
            Metric::RankCorrelation,
        ] {
            assert!(matches!(
                metric.score(&a, &b),
                Err(RecError::DimensionMismatch { .. })
            ));
        }
        assert!(Metric::Rmse.lower_is_better());
        assert!(!Metric::PrecisionAt(5).lower_is_better());
    }
}
