//! Shared fixtures for tests and benchmarks.

#![cfg(any(test, feature = "test-utils"))]

use crate::types::{RatingMatrix, MISSING};
use rand::prelude::*;

/// The 3x3 scenario matrix `[[5, 3, -], [4, -, 2], [-, 5, 4]]`.
pub fn sample_ratings() -> RatingMatrix {
    RatingMatrix::from_row_slice(
        3,
        3,
        &[5.0, 3.0, MISSING, 4.0, MISSING, 2.0, MISSING, 5.0, 4.0],
    )
}

/// Random 1..=5 star ratings where each cell is observed with probability `density`.
///
/// Every user keeps at least one observed rating.
pub fn random_ratings(n_users: usize, n_items: usize, density: f64, seed: u64) -> RatingMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = RatingMatrix::from_fn(n_users, n_items, |_, _| {
        if rng.gen_bool(density) {
            f64::from(rng.gen_range(1u8..=5))
        } else {
            MISSING
        }
    });

    for user in 0..n_users {
        if m.row(user).iter().all(|v| v.is_nan()) && n_items > 0 {
            let item = rng.gen_range(0..n_items);
            m[(user, item)] = f64::from(rng.gen_range(1u8..=5));
        }
    }
    m
}

/// A fully observed matrix of exact rank `rank` with entries in a modest range.
pub fn low_rank_ratings(n_users: usize, n_items: usize, rank: usize, seed: u64) -> RatingMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let users = RatingMatrix::from_fn(n_users, rank, |_, _| rng.gen_range(0.5..1.5));
    let items = RatingMatrix::from_fn(n_items, rank, |_, _| rng.gen_range(0.5..1.5));
    users * items.transpose()
}

/// Hides each cell of `full` with probability `1 - density`, keeping one cell per user.
pub fn mask_ratings(full: &RatingMatrix, density: f64, seed: u64) -> RatingMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut masked = full.clone();
    for user in 0..full.nrows() {
        let keep = rng.gen_range(0..full.ncols());
        for item in 0..full.ncols() {
            if item != keep && !rng.gen_bool(density) {
                masked[(user, item)] = MISSING;
            }
        }
    }
    masked
}
