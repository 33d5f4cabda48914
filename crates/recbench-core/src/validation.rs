//! Argument checks shared by every entry point.
//!
//! All of these run before any computation so that an invalid call never
//! does partial work.

use crate::{
    error::{RecError, Result},
    types::RatingMatrix,
};

/// Fails with [`RecError::EmptyMatrix`] when the matrix has no rows or no columns.
pub fn ensure_non_empty(ratings: &RatingMatrix) -> Result<()> {
    if ratings.is_empty() {
        return Err(RecError::empty_matrix(ratings.shape()));
    }
    Ok(())
}

/// Fails when `user` does not address a row of `ratings`.
pub fn ensure_user(ratings: &RatingMatrix, user: usize) -> Result<()> {
    if user >= ratings.nrows() {
        return Err(RecError::user_out_of_range(user, ratings.nrows()));
    }
    Ok(())
}

/// Fails when a count-like parameter (rank, neighbors, cutoff) is zero.
pub fn ensure_positive(parameter: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(RecError::invalid_argument(
            parameter,
            "must be a positive integer",
        ));
    }
    Ok(())
}

/// Fails when `value` is not a finite number in `[low, high]`.
pub fn ensure_in_range(parameter: &str, value: f64, low: f64, high: f64) -> Result<()> {
    if !value.is_finite() || value < low || value > high {
        return Err(RecError::invalid_argument(
            parameter,
            format!("must lie in [{low}, {high}], got {value}"),
        ));
    }
    Ok(())
}

/// Fails when two matrices do not share a shape.
pub fn ensure_same_shape(expected: &RatingMatrix, actual: &RatingMatrix) -> Result<()> {
    if expected.shape() != actual.shape() {
        return Err(RecError::dimension_mismatch(
            format!("{:?}", expected.shape()),
            format!("{:?}", actual.shape()),
        ));
    }
    Ok(())
}
