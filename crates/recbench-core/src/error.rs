//! Error types for matrix-completion operations.
//!
//! Only invalid arguments and genuinely uncomputable factorizations are
//! reported as errors. Statistical degeneracies (empty neighborhoods, zero
//! similarity sums, all-missing columns) are resolved locally by the engines
//! and never surface here.

use thiserror::Error;

/// Errors that can occur while completing, recommending or evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecError {
    /// A parameter is outside its valid domain.
    ///
    /// Raised before any computation, e.g. for a zero rank or a
    /// training fraction outside `[0, 1]`.
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter
        parameter: String,
        /// Description of the violated constraint
        reason: String,
    },

    /// The rating matrix has no rows or no columns.
    #[error("Rating matrix is empty ({n_users} users x {n_items} items)")]
    EmptyMatrix {
        /// Number of rows of the rejected matrix
        n_users: usize,
        /// Number of columns of the rejected matrix
        n_items: usize,
    },

    /// A user index does not address a row of the matrix.
    #[error("User index {user} is out of range for {n_users} users")]
    UserOutOfRange {
        /// Requested user index
        user: usize,
        /// Number of users in the matrix
        n_users: usize,
    },

    /// Two matrices that must share a shape do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A factorization could not be computed.
    ///
    /// With a positive regularization this is not reachable from ALS; it
    /// guards the unregularized case and SVD factors that were not produced.
    #[error("Numerical failure: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },
}

impl RecError {
    /// Create an InvalidArgument error for a named parameter.
    pub fn invalid_argument<S1, S2>(parameter: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::InvalidArgument {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create an EmptyMatrix error from the rejected shape.
    pub fn empty_matrix(shape: (usize, usize)) -> Self {
        Self::EmptyMatrix {
            n_users: shape.0,
            n_items: shape.1,
        }
    }

    /// Create a UserOutOfRange error.
    pub fn user_out_of_range(user: usize, n_users: usize) -> Self {
        Self::UserOutOfRange { user, n_users }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NumericalError with a custom reason.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }
}

/// Result type alias for matrix-completion operations.
pub type Result<T> = std::result::Result<T, RecError>;
