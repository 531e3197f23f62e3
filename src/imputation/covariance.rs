//! Covariance-preserving imputation.
//!
//! A missing cell is projected onto the linear relation between its column
//! and the row's other present columns, as estimated by the pairwise
//! covariance of the training table.

use crate::cache::{memoize, CacheStatus};
use crate::config::CacheConfig;
use crate::core::error::Result;
use crate::core::types::Real;
use crate::dataset::TableView;
use crate::imputation::ImputationStrategy;
use crate::stats::{CovarianceEstimate, PairwiseMoments};
use ndarray::{s, Array1, Array2};
use std::time::SystemTime;

/// Strategy imputing by least-squares projection on the estimated covariance.
#[derive(Debug, Clone)]
pub struct CovariancePreservationStrategy {
    column_names: Vec<String>,
    estimate: CovarianceEstimate,
    cache_status: CacheStatus,
    trained_at: Option<SystemTime>,
}

impl CovariancePreservationStrategy {
    /// Estimate from every row of `training` with the default cache settings.
    pub fn build(training: &dyn TableView) -> Result<Self> {
        Self::build_with_cache(training, &CacheConfig::default())
    }

    /// Estimate from every row of `training`.
    ///
    /// The persisted block holds the covariance matrix followed by one row of
    /// column means.
    pub fn build_with_cache(training: &dyn TableView, cache: &CacheConfig) -> Result<Self> {
        let num_columns = training.num_columns();
        let compute = || -> Result<Array2<Real>> {
            let mut moments = PairwiseMoments::new(num_columns);
            for row in 0..training.num_rows() {
                moments.accumulate(&training.get_row(row)?.view());
            }
            let estimate = moments.estimate();

            let mut block = Array2::zeros((num_columns + 1, num_columns));
            block.slice_mut(s![..num_columns, ..]).assign(&estimate.cov);
            block.row_mut(num_columns).assign(&estimate.mu);
            Ok(block)
        };

        let (block, cache_status) = if cache.enabled {
            memoize(training, &[], &cache.covariance_stem, num_columns + 1, compute)?
        } else {
            (compute()?, CacheStatus::InMemory)
        };

        log::info!(
            "Built covariance-preserving imputation over {} columns from {} rows ({})",
            num_columns,
            training.num_rows(),
            cache_status
        );

        let estimate = CovarianceEstimate {
            cov: block.slice(s![..num_columns, ..]).to_owned(),
            mu: block.row(num_columns).to_owned(),
        };
        Ok(CovariancePreservationStrategy {
            column_names: training.column_names().to_vec(),
            estimate,
            cache_status,
            trained_at: training.modification_time(),
        })
    }

    /// Estimated covariance matrix.
    pub fn covariance(&self) -> &Array2<Real> {
        &self.estimate.cov
    }

    /// Estimated column means.
    pub fn mu(&self) -> &Array1<Real> {
        &self.estimate.mu
    }

    /// Whether the estimate was reused, rebuilt or computed in memory.
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }
}

impl ImputationStrategy for CovariancePreservationStrategy {
    fn name(&self) -> &'static str {
        "covariance-preserving"
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn modification_time(&self) -> Option<SystemTime> {
        self.trained_at
    }

    fn impute(
        &self,
        source: &dyn TableView,
        row: usize,
        col: usize,
        row_values: Option<&[Real]>,
    ) -> Result<Real> {
        match row_values {
            Some(values) => self.estimate.project(values, col),
            None => {
                let values = source.get_row(row)?.to_vec();
                self.estimate.project(&values, col)
            }
        }
    }
}
