//! Imputation from a fixed table of nearest neighbours.

use crate::config::NeighborhoodConfig;
use crate::core::error::{ImputeError, Result};
use crate::core::missing::is_missing;
use crate::core::types::Real;
use crate::dataset::{
    ensure_same_column_names, ensure_same_columns, latest_modification, SharedView, TableView,
};
use crate::data_error;
use crate::imputation::ImputationStrategy;
use ndarray::Array2;
use std::time::SystemTime;

/// Strategy averaging a cell over the row's precomputed neighbours.
///
/// Row `i` of the imputed source uses row `i` of the index table, whose first
/// `neighbor_count` cells are row indices into the reference tables. The
/// average is taken over neighbours present in the reference table; when all
/// of them are missing, over the same neighbours of the fully imputed
/// fallback table.
#[derive(Debug, Clone)]
pub struct NeighborhoodStrategy {
    neighbors: Array2<usize>,
    reference: SharedView,
    fallback: SharedView,
    indexed_at: Option<SystemTime>,
}

impl NeighborhoodStrategy {
    /// Validate and materialize the neighbour indices.
    pub fn build(
        index_table: &dyn TableView,
        reference_with_missing: SharedView,
        reference_fallback: SharedView,
        neighbor_count: usize,
    ) -> Result<Self> {
        if neighbor_count < 1 || neighbor_count > index_table.num_columns() {
            return Err(ImputeError::invalid_parameter(
                "neighbor_count",
                neighbor_count.to_string(),
                format!(
                    "must be between 1 and the index table width {}",
                    index_table.num_columns()
                ),
            ));
        }
        ensure_same_columns(reference_with_missing.as_ref(), reference_fallback.as_ref())?;
        if reference_with_missing.num_rows() != reference_fallback.num_rows() {
            return Err(ImputeError::dimension_mismatch(
                format!("{} fallback rows", reference_with_missing.num_rows()),
                format!("{} fallback rows", reference_fallback.num_rows()),
            ));
        }

        let reference_rows = reference_with_missing.num_rows();
        let mut neighbors = Array2::zeros((index_table.num_rows(), neighbor_count));
        for row in 0..index_table.num_rows() {
            let indices = index_table.get_sub_row(row, 0, neighbor_count)?;
            for (k, &value) in indices.iter().enumerate() {
                if is_missing(value) || value < 0.0 || value.fract() != 0.0 || value >= reference_rows as Real {
                    return Err(data_error!(
                        row,
                        index_table.column_name(k),
                        "neighbour index {} is not a row of the {}-row reference table",
                        value,
                        reference_rows
                    ));
                }
                neighbors[[row, k]] = value as usize;
            }
        }

        log::info!(
            "Built neighbourhood imputation: {} rows, {} neighbours each, {} reference rows",
            neighbors.nrows(),
            neighbor_count,
            reference_rows
        );

        Ok(NeighborhoodStrategy {
            neighbors,
            reference: reference_with_missing,
            fallback: reference_fallback,
            indexed_at: index_table.modification_time(),
        })
    }

    /// Build with the neighbour count taken from `config`.
    pub fn from_config(
        index_table: &dyn TableView,
        reference_with_missing: SharedView,
        reference_fallback: SharedView,
        config: &NeighborhoodConfig,
    ) -> Result<Self> {
        Self::build(
            index_table,
            reference_with_missing,
            reference_fallback,
            config.neighbor_count,
        )
    }

    /// Neighbours consulted per row.
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.ncols()
    }

    /// Neighbour row indices, one row per imputed source row.
    pub fn neighbors(&self) -> &Array2<usize> {
        &self.neighbors
    }
}

impl ImputationStrategy for NeighborhoodStrategy {
    fn name(&self) -> &'static str {
        "neighbourhood"
    }

    fn column_names(&self) -> &[String] {
        self.reference.column_names()
    }

    fn modification_time(&self) -> Option<SystemTime> {
        latest_modification([
            self.indexed_at,
            self.reference.modification_time(),
            self.fallback.modification_time(),
        ])
    }

    fn check_source(&self, source: &dyn TableView) -> Result<()> {
        ensure_same_column_names(self.column_names(), source.column_names())?;
        if source.num_rows() != self.neighbors.nrows() {
            return Err(ImputeError::dimension_mismatch(
                format!("{} source rows (one per index row)", self.neighbors.nrows()),
                format!("{} source rows", source.num_rows()),
            ));
        }
        Ok(())
    }

    fn impute(&self, _: &dyn TableView, row: usize, col: usize, _: Option<&[Real]>) -> Result<Real> {
        if row >= self.neighbors.nrows() {
            return Err(ImputeError::index_out_of_bounds(row, self.neighbors.nrows()));
        }
        let neighbors = self.neighbors.row(row);

        let mut sum = 0.0;
        let mut count = 0usize;
        for &neighbor in neighbors.iter() {
            let value = self.reference.get(neighbor, col)?;
            if !is_missing(value) {
                sum += value;
                count += 1;
            }
        }
        if count > 0 {
            return Ok(sum / count as Real);
        }

        let mut sum = 0.0;
        for &neighbor in neighbors.iter() {
            let value = self.fallback.get(neighbor, col)?;
            if is_missing(value) {
                return Err(data_error!(
                    neighbor,
                    self.fallback.column_name(col),
                    "fallback reference table holds a missing value"
                ));
            }
            sum += value;
        }
        Ok(sum / neighbors.len() as Real)
    }
}
