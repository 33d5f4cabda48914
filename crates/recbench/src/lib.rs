//! RecBench - an experimental bench for matrix-completion recommenders.
//!
//! A rating matrix is a dense `n_users x n_items` matrix of `f64` in which NaN
//! marks a missing rating. Every engine completes the matrix, predicting each
//! cell, and recommendations are read off the completion.
//!
//! This crate re-exports the three building blocks:
//!
//! - [`core`]: rating matrices, errors, similarity and the engine trait
//! - [`engines`]: popularity, neighborhood, ALS and truncated-SVD engines
//! - [`eval`]: held-out splitting, metrics and multi-trial comparison
//!
//! # Example
//!
//! ```rust
//! use recbench::prelude::*;
//!
//! let m = RatingMatrix::from_row_slice(
//!     3,
//!     3,
//!     &[5.0, 3.0, MISSING, 4.0, MISSING, 2.0, MISSING, 5.0, 4.0],
//! );
//!
//! let engine = Popularity::new();
//! assert_eq!(engine.recommend(&m, 0, true).unwrap(), Recommendation::Item(2));
//!
//! let table = compare(
//!     rmse,
//!     &m,
//!     &[Contender::from_engine(engine)],
//!     &CompareConfig::new().with_trials(2),
//! )
//! .unwrap();
//! assert_eq!(table.rows[0].label, "popularity");
//! ```

pub use recbench_core as core;
pub use recbench_engines as engines;
pub use recbench_eval as eval;

pub use nalgebra;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use recbench_core::prelude::*;
    pub use recbench_engines::{
        Als, AlsConfig, Imputation, Neighborhood, NeighborhoodConfig, Orientation, Popularity,
        Spectral, SpectralConfig,
    };
    pub use recbench_eval::prelude::*;
}
