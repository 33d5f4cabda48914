//! Core types and traits for matrix-completion recommenders.
//!
//! This crate provides the vocabulary shared by every completion engine and
//! by the evaluation harness: the dense rating-matrix representation with its
//! missing-value marker, the error taxonomy, cosine similarity under missing
//! data, the [`CompletionEngine`] trait and the recommender facade.
//!
//! # Key Concepts
//!
//! - **Rating matrix**: dense `n_users x n_items` `f64` matrix, NaN marks a missing rating
//! - **Completion**: a same-shape matrix with a prediction in every cell
//! - **Recommendation**: the best-scored item for a user, or an explicit
//!   [`Recommendation::NoEligibleItem`] outcome
//!
//! # Modules
//!
//! - [`engine`]: Completion-engine trait and closure adapter
//! - [`error`]: Error types
//! - [`recommend`]: Selecting items from predicted scores
//! - [`similarity`]: Cosine similarity restricted to co-observed entries
//! - [`types`]: Rating-matrix aliases and observation queries
//! - [`validation`]: Argument checks

pub mod engine;
pub mod error;
pub mod recommend;
pub mod similarity;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used items at the crate root
pub use engine::{CompletionEngine, FnEngine};
pub use error::{RecError, Result};
pub use recommend::Recommendation;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use recbench_core::prelude::*;
///
/// let m = RatingMatrix::from_element(2, 2, MISSING);
/// assert_eq!(m.observed_count(), 0);
/// ```
pub mod prelude {
    pub use crate::engine::{CompletionEngine, FnEngine};
    pub use crate::error::{RecError, Result};
    pub use crate::recommend::{
        ranked_items, recommend_from_completion, recommend_from_scores, Recommendation,
    };
    pub use crate::similarity::{cosine_similarity, SimilarityCache};
    pub use crate::types::{
        is_observed, missing_matrix, Axis, DMatrix, DVector, RatingMatrix, Ratings, MISSING,
    };
}
