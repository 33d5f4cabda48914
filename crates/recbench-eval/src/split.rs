//! Per-user held-out splitting.

use rand::{seq::index, Rng};
use recbench_core::{
    error::Result,
    types::{is_observed, missing_matrix, RatingMatrix, Ratings, MISSING},
    validation::{ensure_in_range, ensure_non_empty},
};

/// Training and validation matrices partitioning the observed cells of a source matrix.
///
/// Equality treats two missing markers as equal, so identical splits compare
/// equal even though `NaN != NaN`.
#[derive(Debug, Clone)]
pub struct HoldoutSplit {
    /// Ratings available for fitting
    pub train: RatingMatrix,
    /// Ratings withheld for scoring
    pub validation: RatingMatrix,
}

impl PartialEq for HoldoutSplit {
    fn eq(&self, other: &Self) -> bool {
        same_ratings(&self.train, &other.train)
            && same_ratings(&self.validation, &other.validation)
    }
}

fn same_ratings(a: &RatingMatrix, b: &RatingMatrix) -> bool {
    a.shape() == b.shape()
        && a.iter().zip(b.iter()).all(|(x, y)| match (is_observed(*x), is_observed(*y)) {
            (true, true) => x == y,
            (false, false) => true,
            _ => false,
        })
}

/// Splits each user's observed ratings into train and validation subsets.
///
/// For a user with `n >= 2` ratings, `max(1, floor(train_fraction * n))` of
/// them are sampled without replacement into the training matrix and the rest
/// go to the validation matrix. A user with a single rating keeps it in
/// training. Both matrices have the source's shape; cells not assigned to a
/// matrix are missing in it.
///
/// # Example
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use recbench_core::prelude::*;
/// use recbench_eval::split;
///
/// let m = RatingMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, MISSING, MISSING]);
/// let parts = split(&m, 0.5, &mut StdRng::seed_from_u64(0)).unwrap();
/// assert_eq!(parts.train.observed_items(0).len(), 1);
/// assert_eq!(parts.validation.observed_items(0).len(), 2);
/// assert_eq!(parts.train.observed_items(1), vec![0]);
/// ```
pub fn split<R: Rng + ?Sized>(
    ratings: &RatingMatrix,
    train_fraction: f64,
    rng: &mut R,
) -> Result<HoldoutSplit> {
    ensure_non_empty(ratings)?;
    ensure_in_range("train_fraction", train_fraction, 0.0, 1.0)?;

    let (n_users, n_items) = ratings.shape();
    let mut train = missing_matrix(n_users, n_items);
    let mut validation = ratings.clone();

    for user in 0..n_users {
        let observed = ratings.observed_items(user);
        if observed.is_empty() {
            continue;
        }

        let n_train = train_count(observed.len(), train_fraction);
        for position in index::sample(rng, observed.len(), n_train) {
            let item = observed[position];
            train[(user, item)] = ratings[(user, item)];
            validation[(user, item)] = MISSING;
        }
    }

    Ok(HoldoutSplit { train, validation })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn train_count(observed: usize, train_fraction: f64) -> usize {
    if observed == 1 {
        return 1;
    }
    ((train_fraction * observed as f64).floor() as usize).clamp(1, observed)
}
