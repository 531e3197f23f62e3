//! Numeric kernel: missing-aware sorting, column order statistics and
//! pairwise covariance estimation.

pub mod column;
pub mod covariance;
pub mod sort;

pub use column::{summarize_column, ColumnSummary};
pub use covariance::{CovarianceEstimate, PairwiseMoments};
pub use sort::{sort_missing_last, ColumnSorter};
