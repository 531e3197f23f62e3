//! Imputation views and strategies.
//!
//! An [`ImputedView`] wraps a source view and a strategy. Observed cells are
//! passed through untouched; a missing cell is replaced by whatever the
//! strategy computes for it. Strategies compute their parameters once, at
//! build time, from a reference table (memoized on disk through
//! [`crate::cache`] where they are expensive).

pub mod covariance;
pub mod mean_median_mode;
pub mod neighborhood;

pub use covariance::CovariancePreservationStrategy;
pub use mean_median_mode::MeanMedianModeStrategy;
pub use neighborhood::NeighborhoodStrategy;

use crate::core::error::Result;
use crate::core::missing::is_missing;
use crate::core::types::{ColumnLayout, Real};
use crate::dataset::{
    check_cell, ensure_same_column_names, latest_modification, SharedView, TableView,
};
use ndarray::Array1;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Policy computing a value for a missing cell.
pub trait ImputationStrategy: Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Column names the strategy was built for.
    fn column_names(&self) -> &[String];

    /// Latest modification signal of the tables the strategy was built from.
    ///
    /// Imputed cells depend on these tables, so a view wrapping the strategy
    /// is as new as the newest of them.
    fn modification_time(&self) -> Option<SystemTime>;

    /// Value for the missing cell `(row, col)` of `source`.
    ///
    /// `row_values` is the complete source row when the caller already holds
    /// it; strategies that need it fetch it otherwise.
    fn impute(
        &self,
        source: &dyn TableView,
        row: usize,
        col: usize,
        row_values: Option<&[Real]>,
    ) -> Result<Real>;

    /// Check that `source` can be imputed by this strategy.
    fn check_source(&self, source: &dyn TableView) -> Result<()> {
        ensure_same_column_names(self.column_names(), source.column_names())
    }
}

/// View substituting strategy values for the missing cells of its source.
#[derive(Debug)]
pub struct ImputedView<S: ImputationStrategy> {
    source: SharedView,
    strategy: Arc<S>,
    metadata_dir: Option<PathBuf>,
}

impl<S: ImputationStrategy> Clone for ImputedView<S> {
    fn clone(&self) -> Self {
        ImputedView {
            source: self.source.clone(),
            strategy: self.strategy.clone(),
            metadata_dir: self.metadata_dir.clone(),
        }
    }
}

impl<S: ImputationStrategy> ImputedView<S> {
    /// Bind `strategy` to `source`. Fails if the source's columns are not the
    /// ones the strategy was built for.
    pub fn new(source: SharedView, strategy: S) -> Result<Self> {
        Self::with_shared(source, Arc::new(strategy))
    }

    /// Bind a strategy shared with other views.
    pub fn with_shared(source: SharedView, strategy: Arc<S>) -> Result<Self> {
        strategy.check_source(source.as_ref())?;
        log::debug!(
            "Bound {} imputation to a {}x{} source",
            strategy.name(),
            source.num_rows(),
            source.num_columns()
        );
        Ok(ImputedView {
            source,
            strategy,
            metadata_dir: None,
        })
    }

    /// Persist statistics derived from the imputed table under `dir`.
    pub fn with_metadata_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    /// Attached strategy.
    pub fn strategy(&self) -> &Arc<S> {
        &self.strategy
    }

    /// Wrapped source.
    pub fn source(&self) -> &SharedView {
        &self.source
    }

    fn fill(&self, row: usize, col: usize, value: Real, context: Option<&[Real]>) -> Result<Real> {
        if is_missing(value) {
            self.strategy.impute(self.source.as_ref(), row, col, context)
        } else {
            Ok(value)
        }
    }
}

impl<S: ImputationStrategy> TableView for ImputedView<S> {
    fn num_rows(&self) -> usize {
        self.source.num_rows()
    }

    fn num_columns(&self) -> usize {
        self.source.num_columns()
    }

    fn column_names(&self) -> &[String] {
        self.source.column_names()
    }

    fn layout(&self) -> ColumnLayout {
        self.source.layout()
    }

    fn get(&self, row: usize, col: usize) -> Result<Real> {
        check_cell(self, row, col)?;
        let value = self.source.get(row, col)?;
        self.fill(row, col, value, None)
    }

    fn get_sub_row(&self, row: usize, start: usize, len: usize) -> Result<Array1<Real>> {
        let mut values = self.source.get_sub_row(row, start, len)?;
        if !values.iter().any(|v| is_missing(*v)) {
            return Ok(values);
        }
        let full = self.source.get_row(row)?.to_vec();
        for (offset, cell) in values.iter_mut().enumerate() {
            *cell = self.fill(row, start + offset, *cell, Some(&full))?;
        }
        Ok(values)
    }

    fn get_row(&self, row: usize) -> Result<Array1<Real>> {
        let original = self.source.get_row(row)?.to_vec();
        let mut values = Array1::from_vec(original.clone());
        for (col, cell) in values.iter_mut().enumerate() {
            *cell = self.fill(row, col, *cell, Some(&original))?;
        }
        Ok(values)
    }

    fn get_column(&self, col: usize) -> Result<Array1<Real>> {
        let mut values = self.source.get_column(col)?;
        for (row, cell) in values.iter_mut().enumerate() {
            *cell = self.fill(row, col, *cell, None)?;
        }
        Ok(values)
    }

    fn modification_time(&self) -> Option<SystemTime> {
        latest_modification([
            self.source.modification_time(),
            self.strategy.modification_time(),
        ])
    }

    fn metadata_dir(&self) -> Option<&Path> {
        self.metadata_dir.as_deref()
    }
}
