//! Evaluation harness for matrix-completion engines.
//!
//! This crate measures how well [`CompletionEngine`](recbench_core::CompletionEngine)
//! implementations predict withheld ratings:
//!
//! - [`split`]: per-user held-out splitting of a rating matrix
//! - [`metrics`]: error, ranking and coverage scores of a completion
//! - [`compare`]: repeated trials over several engines, aggregated per engine
//!
//! # Features
//!
//! - `parallel`: run comparison trials on the rayon thread pool
//! - `serde`: serialize configurations and comparison tables

pub mod compare;
pub mod metrics;
pub mod split;

pub use compare::{compare, CompareConfig, ComparisonRow, ComparisonTable, Contender};
pub use metrics::{
    item_coverage, mae, precision_at_k, rank_correlation, recall_at_k, rmse, user_coverage,
    Metric,
};
pub use split::{split, HoldoutSplit};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compare::{compare, CompareConfig, ComparisonRow, ComparisonTable, Contender};
    pub use crate::metrics::{
        item_coverage, mae, precision_at_k, rank_correlation, recall_at_k, rmse, user_coverage,
        Metric,
    };
    pub use crate::split::{split, HoldoutSplit};
}
