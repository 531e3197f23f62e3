//! Row-filtering views: exclude a set of rows, or select rows by index.
//!
//! Both views remap row indices onto their source and copy no data.

use crate::core::error::{ImputeError, Result};
use crate::core::types::{ColumnLayout, Real};
use crate::dataset::{check_column, latest_modification, SharedView, TableView};
use ndarray::Array1;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// View of a source with a sorted set of rows excluded.
#[derive(Debug, Clone)]
pub struct RemoveRowsView {
    source: SharedView,
    /// Excluded source rows, strictly increasing
    removed: Vec<usize>,
    metadata_dir: Option<PathBuf>,
    edited: Option<SystemTime>,
}

impl RemoveRowsView {
    /// View of `source` without the rows listed in `removed` (any order, duplicates ignored).
    pub fn new(source: SharedView, removed: impl IntoIterator<Item = usize>) -> Result<Self> {
        let num_rows = source.num_rows();
        let mut removed: Vec<usize> = removed.into_iter().collect();
        if let Some(&bad) = removed.iter().find(|&&r| r >= num_rows) {
            return Err(ImputeError::index_out_of_bounds(bad, num_rows));
        }
        removed.sort_unstable();
        removed.dedup();
        Ok(RemoveRowsView {
            source,
            removed,
            metadata_dir: None,
            edited: None,
        })
    }

    /// Persist derived statistics under `dir`.
    pub fn with_metadata_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    /// Exclude source row `source_row`. Returns `false` if it was already excluded.
    pub fn remove(&mut self, source_row: usize) -> Result<bool> {
        if source_row >= self.source.num_rows() {
            return Err(ImputeError::index_out_of_bounds(
                source_row,
                self.source.num_rows(),
            ));
        }
        match self.removed.binary_search(&source_row) {
            Ok(_) => Ok(false),
            Err(pos) => {
                self.removed.insert(pos, source_row);
                self.edited = Some(SystemTime::now());
                Ok(true)
            }
        }
    }

    /// Re-include source row `source_row`. Returns `false` if it was not excluded.
    pub fn unremove(&mut self, source_row: usize) -> bool {
        match self.removed.binary_search(&source_row) {
            Ok(pos) => {
                self.removed.remove(pos);
                self.edited = Some(SystemTime::now());
                true
            }
            Err(_) => false,
        }
    }

    /// Excluded source rows in increasing order.
    pub fn removed_rows(&self) -> &[usize] {
        &self.removed
    }

    /// Source row shown at `row`.
    ///
    /// The number of kept rows before `removed[p]` is `removed[p] - p`, which
    /// never decreases with `p`; the answer is `row` shifted by the number of
    /// excluded rows whose kept-prefix does not exceed `row`.
    pub fn source_row(&self, row: usize) -> Result<usize> {
        if row >= self.num_rows() {
            return Err(ImputeError::index_out_of_bounds(row, self.num_rows()));
        }
        let (mut lo, mut hi) = (0, self.removed.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.removed[mid] - mid <= row {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(row + lo)
    }

    /// Wrapped source.
    pub fn source(&self) -> &SharedView {
        &self.source
    }
}

impl TableView for RemoveRowsView {
    fn num_rows(&self) -> usize {
        self.source.num_rows() - self.removed.len()
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
        self.source.get(self.source_row(row)?, col)
    }

    fn get_sub_row(&self, row: usize, start: usize, len: usize) -> Result<Array1<Real>> {
        self.source.get_sub_row(self.source_row(row)?, start, len)
    }

    fn get_row(&self, row: usize) -> Result<Array1<Real>> {
        self.source.get_row(self.source_row(row)?)
    }

    fn get_column(&self, col: usize) -> Result<Array1<Real>> {
        check_column(self, col)?;
        // Merge-style walk: one pass over the source rows.
        let mut out = Vec::with_capacity(self.num_rows());
        let mut next_removed = self.removed.iter().peekable();
        for source_row in 0..self.source.num_rows() {
            if next_removed.peek() == Some(&&source_row) {
                next_removed.next();
                continue;
            }
            out.push(self.source.get(source_row, col)?);
        }
        Ok(Array1::from_vec(out))
    }

    fn modification_time(&self) -> Option<SystemTime> {
        latest_modification([self.source.modification_time(), self.edited])
    }

    fn metadata_dir(&self) -> Option<&Path> {
        self.metadata_dir.as_deref()
    }
}

/// View presenting selected source rows, in the given order.
///
/// The same source row may appear any number of times.
#[derive(Debug, Clone)]
pub struct SelectRowsView {
    source: SharedView,
    selected: Vec<usize>,
    metadata_dir: Option<PathBuf>,
}

impl SelectRowsView {
    /// View whose row `i` is source row `selected[i]`.
    pub fn new(source: SharedView, selected: Vec<usize>) -> Result<Self> {
        let num_rows = source.num_rows();
        if let Some(&bad) = selected.iter().find(|&&r| r >= num_rows) {
            return Err(ImputeError::index_out_of_bounds(bad, num_rows));
        }
        Ok(SelectRowsView {
            source,
            selected,
            metadata_dir: None,
        })
    }

    /// The first `count` rows of `source`.
    pub fn head(source: SharedView, count: usize) -> Result<Self> {
        let selected = (0..count).collect();
        Self::new(source, selected)
    }

    /// Persist derived statistics under `dir`.
    pub fn with_metadata_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    /// Selected source rows.
    pub fn selected_rows(&self) -> &[usize] {
        &self.selected
    }

    fn source_row(&self, row: usize) -> Result<usize> {
        self.selected
            .get(row)
            .copied()
            .ok_or_else(|| ImputeError::index_out_of_bounds(row, self.selected.len()))
    }
}

impl TableView for SelectRowsView {
    fn num_rows(&self) -> usize {
        self.selected.len()
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
        self.source.get(self.source_row(row)?, col)
    }

    fn get_sub_row(&self, row: usize, start: usize, len: usize) -> Result<Array1<Real>> {
        self.source.get_sub_row(self.source_row(row)?, start, len)
    }

    fn get_row(&self, row: usize) -> Result<Array1<Real>> {
        self.source.get_row(self.source_row(row)?)
    }

    fn modification_time(&self) -> Option<SystemTime> {
        self.source.modification_time()
    }

    fn metadata_dir(&self) -> Option<&Path> {
        self.metadata_dir.as_deref()
    }
}
