//! # tabimpute
//!
//! Composable, read-only tabular views with missing-value imputation whose
//! statistics are memoized on disk and shared safely between processes.
//!
//! ## Features
//!
//! - **Views without copies**: [`MemoryTable`] holds raw data;
//!   [`RemoveRowsView`], [`SelectRowsView`] and [`ImputedView`] wrap another
//!   view and remap or substitute cells on access.
//! - **Imputation strategies**: per-column mean/median/mode with wildcard
//!   column patterns, covariance-preserving projection, and fixed
//!   nearest-neighbour averaging.
//! - **Disk memoization**: statistics live next to the training table and are
//!   rebuilt only when it changes, under an advisory directory lock.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabimpute::{
//!     ImputedView, MeanMedianModeConfigBuilder, MeanMedianModeStrategy, MemoryTable, TableView,
//! };
//!
//! # fn main() -> tabimpute::Result<()> {
//! tabimpute::init()?;
//!
//! let training = Arc::new(MemoryTable::from_csv("train.csv")?);
//! let config = MeanMedianModeConfigBuilder::new()
//!     .instruction("income*", "median")
//!     .default_instruction("mean")
//!     .build()?;
//!
//! // Statistics are cached in train.csv.metadata/
//! let strategy = MeanMedianModeStrategy::build(training.as_ref(), &config)?;
//! let imputed = ImputedView::new(training, strategy)?;
//! println!("{:?}", imputed.get_row(0)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod cache;
pub mod config;
pub mod core;
pub mod dataset;
pub mod imputation;
pub mod stats;

// Re-export core functionality for convenience
pub use crate::core::{
    constants::*,
    error::{CacheError, ImputeError, Result, SortError},
    missing::{compare_missing_last, is_missing},
    types::*,
};

// Re-export configuration functionality
pub use crate::config::{
    CacheConfig, FieldInstruction, ImputeConfig, MeanMedianModeConfig,
    MeanMedianModeConfigBuilder, NeighborhoodConfig,
};

// Re-export dataset functionality
pub use crate::dataset::{
    loader::metadata_dir_for, write_csv, MemoryTable, RemoveRowsView, SelectRowsView,
    SharedView, TableView,
};

// Re-export cache functionality
pub use crate::cache::{ensure_fresh, load_artifact, CacheStatus, DirectoryLock, StatsArtifact};

// Re-export imputation functionality
pub use crate::imputation::{
    CovariancePreservationStrategy, ImputationStrategy, ImputedView, MeanMedianModeStrategy,
    NeighborhoodStrategy,
};

// Re-export statistics functionality
pub use crate::stats::{sort_missing_last, ColumnSorter};

// Version information
pub use crate::core::constants::TABIMPUTE_VERSION as VERSION;

/// Initialize the library.
///
/// Sets up `env_logger` (filter from `RUST_LOG`, `info` by default). Safe to
/// call more than once; a logger installed by the host application is kept.
///
/// # Examples
///
/// ```rust
/// fn main() -> tabimpute::Result<()> {
///     tabimpute::init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::initialize_core()
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    crate::core::is_core_initialized()
}
