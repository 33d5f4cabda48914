//! Alternating least squares factorization.
//!
//! The training matrix is approximated by `U * V^T` with `U` (users x rank)
//! and `V` (items x rank). Each sweep solves, for every user with at least
//! one rating, the ridge-regularized normal equations
//!
//! `(R^T R + lambda I) u_i = R^T r`
//!
//! where `R` stacks the item factors of the items user `i` rated and `r` the
//! corresponding ratings, then does the same for every item against the user
//! factors. Rows without any rating keep their random initialization.
//!
//! For `lambda > 0` the system matrix is positive definite, so the Cholesky
//! solve always succeeds even when a row has fewer ratings than `rank`.

use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Uniform;
use recbench_core::{
    engine::CompletionEngine,
    error::{RecError, Result},
    recommend::Recommendation,
    types::{RatingMatrix, Ratings},
    validation::{ensure_in_range, ensure_non_empty, ensure_positive},
};
use tracing::debug;

/// Configuration for the ALS engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlsConfig {
    /// Number of latent factors
    pub rank: usize,
    /// Number of alternating sweeps
    pub iterations: usize,
    /// Ridge regularization strength
    pub lambda: f64,
    /// Seed for the random factor initialization
    pub seed: u64,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            rank: 10,
            iterations: 5,
            lambda: 0.1,
            seed: 0,
        }
    }
}

impl AlsConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of latent factors.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    /// Sets the number of sweeps.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the regularization strength.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks rank and regularization.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("rank", self.rank)?;
        ensure_in_range("lambda", self.lambda, 0.0, f64::MAX)
    }
}

/// Latent factors produced by one ALS run.
#[derive(Debug, Clone)]
pub struct Factors {
    /// User factors, one row per user
    pub users: DMatrix<f64>,
    /// Item factors, one row per item
    pub items: DMatrix<f64>,
}

impl Factors {
    /// Dense reconstruction `U * V^T`.
    pub fn reconstruct(&self) -> RatingMatrix {
        &self.users * self.items.transpose()
    }
}

/// Factorizes `ratings` with the randomness drawn from `rng`.
pub fn factorize<R: Rng + ?Sized>(
    ratings: &RatingMatrix,
    config: &AlsConfig,
    rng: &mut R,
) -> Result<Factors> {
    ensure_non_empty(ratings)?;
    config.validate()?;

    let (n_users, n_items) = ratings.shape();
    let init = Uniform::new(0.0, 1.0);
    let mut users = DMatrix::from_fn(n_users, config.rank, |_, _| rng.sample(&init));
    let mut items = DMatrix::from_fn(n_items, config.rank, |_, _| rng.sample(&init));

    let rated_by_user: Vec<Vec<usize>> =
        (0..n_users).map(|u| ratings.observed_items(u)).collect();
    let raters_of_item: Vec<Vec<usize>> =
        (0..n_items).map(|j| ratings.observed_users(j)).collect();

    for iteration in 0..config.iterations {
        for (user, rated) in rated_by_user.iter().enumerate() {
            if rated.is_empty() {
                continue;
            }
            let targets =
                DVector::from_iterator(rated.len(), rated.iter().map(|&j| ratings[(user, j)]));
            let solution = solve_row(&items, rated, &targets, config.lambda)?;
            users.row_mut(user).copy_from(&solution.transpose());
        }

        for (item, raters) in raters_of_item.iter().enumerate() {
            if raters.is_empty() {
                continue;
            }
            let targets =
                DVector::from_iterator(raters.len(), raters.iter().map(|&u| ratings[(u, item)]));
            let solution = solve_row(&users, raters, &targets, config.lambda)?;
            items.row_mut(item).copy_from(&solution.transpose());
        }

        debug!(
            iteration = iteration + 1,
            train_rmse = observed_rmse(ratings, &users, &items),
            "ALS sweep finished"
        );
    }

    Ok(Factors { users, items })
}

/// Solves `(F_S^T F_S + lambda I) x = F_S^T targets` for the rows `S` of `fixed`.
fn solve_row(
    fixed: &DMatrix<f64>,
    rows: &[usize],
    targets: &DVector<f64>,
    lambda: f64,
) -> Result<DVector<f64>> {
    let selected = fixed.select_rows(rows);
    let selected_t = selected.transpose();
    let rank = fixed.ncols();

    let system = &selected_t * &selected + DMatrix::<f64>::identity(rank, rank) * lambda;
    let rhs = &selected_t * targets;

    if let Some(cholesky) = system.clone().cholesky() {
        return Ok(cholesky.solve(&rhs));
    }

    // Only reachable without regularization.
    system
        .lu()
        .solve(&rhs)
        .ok_or_else(|| RecError::numerical_error("ALS normal equations are singular"))
}

fn observed_rmse(ratings: &RatingMatrix, users: &DMatrix<f64>, items: &DMatrix<f64>) -> f64 {
    let (mut sum, mut count) = (0.0, 0usize);
    for user in 0..ratings.nrows() {
        for item in 0..ratings.ncols() {
            if ratings.is_rated(user, item) {
                let residual = ratings[(user, item)] - users.row(user).dot(&items.row(item));
                sum += residual * residual;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}

/// Completes `ratings` as `U * V^T` with factors drawn from `rng`.
///
/// Observed cells are reconstructed too; they are not copied from the input.
pub fn complete_als<R: Rng + ?Sized>(
    ratings: &RatingMatrix,
    config: &AlsConfig,
    rng: &mut R,
) -> Result<RatingMatrix> {
    Ok(factorize(ratings, config, rng)?.reconstruct())
}

/// Best item for `user` from an ALS completion seeded with `config.seed`.
pub fn recommend_als(
    ratings: &RatingMatrix,
    user: usize,
    novel_only: bool,
    config: &AlsConfig,
) -> Result<Recommendation> {
    Als::new(config.clone()).recommend(ratings, user, novel_only)
}

/// ALS completion engine, seeded from its configuration.
#[derive(Debug, Clone, Default)]
pub struct Als {
    config: AlsConfig,
}

impl Als {
    /// Creates an engine from a configuration.
    pub fn new(config: AlsConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &AlsConfig {
        &self.config
    }
}

impl CompletionEngine for Als {
    fn name(&self) -> &str {
        "als"
    }

    fn complete(&self, ratings: &RatingMatrix) -> Result<RatingMatrix> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        complete_als(ratings, &self.config, &mut rng)
    }
}
