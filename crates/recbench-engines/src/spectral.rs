//! Truncated SVD reconstruction.
//!
//! Missing cells are first imputed, then the imputed matrix is decomposed and
//! rebuilt from its `rank` largest singular triplets:
//! `U_k * diag(s_k) * V_k^T`. The result approximates the imputed matrix as a
//! whole, so observed cells are not reproduced exactly.

use recbench_core::{
    engine::CompletionEngine,
    error::{RecError, Result},
    recommend::Recommendation,
    types::{is_observed, DMatrix, RatingMatrix, Ratings},
    validation::{ensure_non_empty, ensure_positive},
};
use tracing::debug;

/// How missing cells are filled before decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Imputation {
    /// Missing cells become 0.
    #[default]
    ZeroFill,
    /// Missing cells take their column's observed mean, 0 for empty columns.
    ColumnMean,
}

impl Imputation {
    /// Returns a copy of `ratings` with every missing cell filled.
    pub fn impute(self, ratings: &RatingMatrix) -> Result<RatingMatrix> {
        ensure_non_empty(ratings)?;

        let mut filled = ratings.clone();
        for (item, mut column) in filled.column_iter_mut().enumerate() {
            let fill = match self {
                Self::ZeroFill => 0.0,
                Self::ColumnMean => ratings.item_mean(item).unwrap_or(0.0),
            };
            for value in column.iter_mut().filter(|value| !is_observed(**value)) {
                *value = fill;
            }
        }
        Ok(filled)
    }
}

/// Configuration for the spectral engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectralConfig {
    /// Number of singular triplets kept
    pub rank: usize,
    /// Missing-value policy applied before decomposition
    pub imputation: Imputation,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            rank: 10,
            imputation: Imputation::ZeroFill,
        }
    }
}

impl SpectralConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the truncation rank.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Sets the imputation policy.
    pub fn with_imputation(mut self, imputation: Imputation) -> Self {
        self.imputation = imputation;
        self
    }

    /// Checks that the rank is positive.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("rank", self.rank)
    }
}

/// Rank-`rank` reconstruction of the imputed matrix.
///
/// A rank above `min(n_users, n_items)` keeps every singular triplet.
pub fn complete_svd(ratings: &RatingMatrix, config: &SpectralConfig) -> Result<RatingMatrix> {
    config.validate()?;
    ensure_non_empty(ratings)?;

    let filled = config.imputation.impute(ratings)?;
    let svd = filled.svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| RecError::numerical_error("SVD failed to compute U"))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| RecError::numerical_error("SVD failed to compute V^T"))?;
    let singular_values = &svd.singular_values;

    let kept = config.rank.min(singular_values.len());
    debug!(
        requested_rank = config.rank,
        kept_rank = kept,
        largest = singular_values[0],
        smallest_kept = singular_values[kept - 1],
        "truncated SVD"
    );

    let u_k = u.columns(0, kept);
    let sigma_k = DMatrix::from_diagonal(&singular_values.rows(0, kept).into_owned());
    let v_t_k = v_t.rows(0, kept);

    Ok(u_k * sigma_k * v_t_k)
}

/// Best item for `user` from a truncated-SVD completion.
pub fn recommend_svd(
    ratings: &RatingMatrix,
    user: usize,
    novel_only: bool,
    config: &SpectralConfig,
) -> Result<Recommendation> {
    Spectral::new(config.clone()).recommend(ratings, user, novel_only)
}

/// Truncated-SVD completion engine.
#[derive(Debug, Clone, Default)]
pub struct Spectral {
    config: SpectralConfig,
}

impl Spectral {
    /// Creates an engine from a configuration.
    pub fn new(config: SpectralConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }
}

impl CompletionEngine for Spectral {
    fn name(&self) -> &str {
        match self.config.imputation {
            Imputation::ZeroFill => "svd-zero",
            Imputation::ColumnMean => "svd-mean",
        }
    }

    fn complete(&self, ratings: &RatingMatrix) -> Result<RatingMatrix> {
        complete_svd(ratings, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use recbench_core::{
        test_utils::{low_rank_ratings, sample_ratings},
        types::MISSING,
    };

    #[test]
    fn test_imputation_policies() {
        let m = sample_ratings();

        let zeros = Imputation::ZeroFill.impute(&m).unwrap();
        assert_eq!(zeros[(0, 2)], 0.0);
        assert_eq!(zeros[(1, 1)], 0.0);
        assert_eq!(zeros[(0, 0)], 5.0);

        let means = Imputation::ColumnMean.impute(&m).unwrap();
        assert_relative_eq!(means[(0, 2)], 3.0);
        assert_relative_eq!(means[(1, 1)], 4.0);
        assert_relative_eq!(means[(2, 0)], 4.5);

        // The caller's matrix is untouched.
        assert!(m[(0, 2)].is_nan());
    }

    #[test]
    fn test_empty_column_mean_is_zero() {
        let m = RatingMatrix::from_row_slice(2, 2, &[1.0, MISSING, 2.0, MISSING]);
        let filled = Imputation::ColumnMean.impute(&m).unwrap();
        assert_eq!(filled[(0, 1)], 0.0);
        assert_eq!(filled[(1, 1)], 0.0);
    }

    #[test]
    fn test_full_rank_reproduces_input() {
        let full = low_rank_ratings(6, 5, 5, 11);
        let completed = complete_svd(&full, &SpectralConfig::new().with_rank(5)).unwrap();
        for (a, b) in completed.iter().zip(full.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_truncation_recovers_low_rank() {
        let full = low_rank_ratings(8, 6, 2, 5);
        let completed = complete_svd(&full, &SpectralConfig::new().with_rank(2)).unwrap();
        for (a, b) in completed.iter().zip(full.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }

        let rank_one = complete_svd(&full, &SpectralConfig::new().with_rank(1)).unwrap();
        assert_eq!(rank_one.shape(), full.shape());
        assert_eq!(rank_one.rank(1e-9), 1);
    }

    #[test]
    fn test_oversized_rank_is_truncated() {
        let m = sample_ratings();
        let completed = Spectral::default().complete(&m).unwrap();
        assert_eq!(completed.shape(), (3, 3));
        assert!(completed.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_invalid_arguments() {
        let m = sample_ratings();
        assert!(matches!(
            complete_svd(&m, &SpectralConfig::new().with_rank(0)),
            Err(RecError::InvalidArgument { .. })
        ));
        assert!(matches!(
            complete_svd(&RatingMatrix::zeros(0, 2), &SpectralConfig::new()),
            Err(RecError::EmptyMatrix { .. })
        ));
        assert!(Spectral::default().recommend(&m, 9, true).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(Spectral::default().name(), "svd-zero");
        let mean = Spectral::new(SpectralConfig::new().with_imputation(Imputation::ColumnMean));
        assert_eq!(mean.name(), "svd-mean");
        assert_eq!(mean.config().imputation, Imputation::ColumnMean);
    }
}
