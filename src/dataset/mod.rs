//! Tabular views.
//!
//! A view is a logical, read-only matrix of [`Real`] cells with named columns.
//! Concrete views either read raw storage ([`MemoryTable`]) or wrap exactly
//! one other view ([`RemoveRowsView`], [`SelectRowsView`] and
//! [`ImputedView`](crate::imputation::ImputedView)). Wrapped sources are held
//! through [`SharedView`] so the same table can feed several consumers; no
//! wrapper ever mutates its source.

pub mod filter;
pub mod loader;
pub mod memory;

pub use filter::{RemoveRowsView, SelectRowsView};
pub use loader::write_csv;
pub use memory::MemoryTable;

use crate::core::error::{ImputeError, Result};
use crate::core::types::{ColumnLayout, Real};
use ndarray::Array1;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Shared, reference-counted handle on a view.
pub type SharedView = Arc<dyn TableView>;

/// Read access to a logical table.
///
/// Every accessor may fail: wrappers that substitute values can reject a
/// cell (see [`ImputationInstruction::Error`](crate::core::types::ImputationInstruction::Error)).
pub trait TableView: Debug + Send + Sync {
    /// Number of rows.
    fn num_rows(&self) -> usize;

    /// Number of columns.
    fn num_columns(&self) -> usize;

    /// Column names, one per column, unique.
    fn column_names(&self) -> &[String];

    /// Input/target/weight partition of the columns.
    fn layout(&self) -> ColumnLayout {
        ColumnLayout::all_inputs(self.num_columns())
    }

    /// Cell value.
    fn get(&self, row: usize, col: usize) -> Result<Real>;

    /// `len` consecutive cells of `row` starting at column `start`.
    fn get_sub_row(&self, row: usize, start: usize, len: usize) -> Result<Array1<Real>> {
        check_sub_row(self, row, start, len)?;
        let mut out = Array1::zeros(len);
        for (offset, cell) in out.iter_mut().enumerate() {
            *cell = self.get(row, start + offset)?;
        }
        Ok(out)
    }

    /// Full row.
    fn get_row(&self, row: usize) -> Result<Array1<Real>> {
        self.get_sub_row(row, 0, self.num_columns())
    }

    /// Full column.
    fn get_column(&self, col: usize) -> Result<Array1<Real>> {
        check_column(self, col)?;
        let mut out = Array1::zeros(self.num_rows());
        for (row, cell) in out.iter_mut().enumerate() {
            *cell = self.get(row, col)?;
        }
        Ok(out)
    }

    /// Last time the content of this view changed, when known.
    ///
    /// `None` means the view offers no modification signal; artifacts derived
    /// from it are never considered stale on its account.
    fn modification_time(&self) -> Option<SystemTime> {
        None
    }

    /// Directory where statistics derived from this view are persisted.
    fn metadata_dir(&self) -> Option<&Path> {
        None
    }

    /// Index of the column called `name`.
    fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names().iter().position(|n| n == name)
    }

    /// Name of column `col`, or its index as text when out of range.
    fn column_name(&self, col: usize) -> String {
        self.column_names()
            .get(col)
            .cloned()
            .unwrap_or_else(|| col.to_string())
    }
}

/// Check that `(row, col)` lies inside `view`.
pub fn check_cell<V: TableView + ?Sized>(view: &V, row: usize, col: usize) -> Result<()> {
    if row >= view.num_rows() {
        return Err(ImputeError::index_out_of_bounds(row, view.num_rows()));
    }
    check_column(view, col)
}

/// Check that `col` is a column of `view`.
pub fn check_column<V: TableView + ?Sized>(view: &V, col: usize) -> Result<()> {
    if col >= view.num_columns() {
        return Err(ImputeError::index_out_of_bounds(col, view.num_columns()));
    }
    Ok(())
}

/// Check a sub-row request against `view`.
pub fn check_sub_row<V: TableView + ?Sized>(
    view: &V,
    row: usize,
    start: usize,
    len: usize,
) -> Result<()> {
    if row >= view.num_rows() {
        return Err(ImputeError::index_out_of_bounds(row, view.num_rows()));
    }
    if start + len > view.num_columns() {
        return Err(ImputeError::index_out_of_bounds(
            start + len,
            view.num_columns(),
        ));
    }
    Ok(())
}

/// Check that column names are unique and match the column count.
pub fn validate_column_names(names: &[String], num_columns: usize) -> Result<()> {
    if names.len() != num_columns {
        return Err(ImputeError::dimension_mismatch(
            format!("{} column names", num_columns),
            format!("{} column names", names.len()),
        ));
    }
    let mut seen = std::collections::HashSet::with_capacity(names.len());
    let duplicates: Vec<&str> = names
        .iter()
        .filter(|name| !seen.insert(name.as_str()))
        .map(|name| name.as_str())
        .collect();
    if !duplicates.is_empty() {
        return Err(ImputeError::config(format!(
            "duplicate column names: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

/// Check that two views describe the same columns.
pub fn ensure_same_columns(expected: &dyn TableView, actual: &dyn TableView) -> Result<()> {
    ensure_same_column_names(expected.column_names(), actual.column_names())
}

/// Check that two column name lists are identical.
pub fn ensure_same_column_names(expected: &[String], actual: &[String]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(ImputeError::dimension_mismatch(
            format!("{} columns", expected.len()),
            format!("{} columns", actual.len()),
        ));
    }
    if expected != actual {
        return Err(ImputeError::dimension_mismatch(
            format!("columns [{}]", expected.join(", ")),
            format!("columns [{}]", actual.join(", ")),
        ));
    }
    Ok(())
}

/// Latest of several optional modification times.
pub fn latest_modification(times: impl IntoIterator<Item = Option<SystemTime>>) -> Option<SystemTime> {
    times.into_iter().flatten().max()
}

/// Default column names `col0, col1, ...`.
pub fn default_column_names(num_columns: usize) -> Vec<String> {
    (0..num_columns).map(|i| format!("col{}", i)).collect()
}
