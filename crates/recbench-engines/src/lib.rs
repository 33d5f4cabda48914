//! Matrix-completion engines.
//!
//! This crate provides concrete [`CompletionEngine`] implementations. Each
//! engine takes a training rating matrix (NaN marks a missing rating) and
//! returns a dense matrix of predictions of the same shape.
//!
//! # Available Engines
//!
//! - **Popularity**: item-mean imputation, observed cells kept exactly
//! - **Neighborhood**: user-based or item-based k-nearest-neighbor prediction
//! - **ALS**: alternating ridge-regularized least-squares factorization
//! - **Spectral**: imputation followed by truncated SVD reconstruction
//!
//! # Examples
//!
//! ```rust
//! use recbench_core::prelude::*;
//! use recbench_engines::{Als, AlsConfig, Neighborhood, Popularity};
//!
//! let m = RatingMatrix::from_row_slice(
//!     3,
//!     3,
//!     &[5.0, 3.0, MISSING, 4.0, MISSING, 2.0, MISSING, 5.0, 4.0],
//! );
//!
//! let completed = Popularity::new().complete(&m).unwrap();
//! assert_eq!(completed[(0, 2)], 3.0);
//!
//! let knn = Neighborhood::user_based(2);
//! assert!(knn.recommend(&m, 0, true).unwrap().item().is_some());
//!
//! let als = Als::new(AlsConfig::new().with_rank(2).with_seed(1));
//! assert_eq!(als.complete(&m).unwrap().shape(), (3, 3));
//! ```

pub mod als;
pub mod neighborhood;
pub mod popularity;
pub mod spectral;

// Re-export main engines for convenience
pub use als::{complete_als, factorize, recommend_als, Als, AlsConfig, Factors};
pub use neighborhood::{
    complete_knn_item, complete_knn_user, complete_neighborhood, recommend_knn_item,
    recommend_knn_user, Neighborhood, NeighborhoodConfig, Orientation,
};
pub use popularity::{complete_popularity, item_means, recommend_popularity, Popularity};
pub use spectral::{complete_svd, recommend_svd, Imputation, Spectral, SpectralConfig};

// Re-export commonly used items from core
pub use recbench_core::{CompletionEngine, Recommendation};
