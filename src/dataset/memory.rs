//! In-memory raw storage.

use crate::core::error::{ImputeError, Result};
use crate::core::types::{ColumnLayout, Real};
use crate::dataset::{check_cell, check_column, check_sub_row, default_column_names, validate_column_names, TableView};
use ndarray::{s, Array1, Array2};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Table backed by a dense row-major matrix.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    data: Array2<Real>,
    column_names: Vec<String>,
    layout: ColumnLayout,
    metadata_dir: Option<PathBuf>,
    modified: SystemTime,
}

impl MemoryTable {
    /// Wrap `data` with the given column names.
    pub fn new(data: Array2<Real>, column_names: Vec<String>) -> Result<Self> {
        validate_column_names(&column_names, data.ncols())?;
        let layout = ColumnLayout::all_inputs(data.ncols());
        Ok(MemoryTable {
            data,
            column_names,
            layout,
            metadata_dir: None,
            modified: SystemTime::now(),
        })
    }

    /// Wrap `data` with generated column names `col0, col1, ...`.
    pub fn from_array(data: Array2<Real>) -> Self {
        let column_names = default_column_names(data.ncols());
        let layout = ColumnLayout::all_inputs(data.ncols());
        MemoryTable {
            data,
            column_names,
            layout,
            metadata_dir: None,
            modified: SystemTime::now(),
        }
    }

    /// Build from row vectors, which must all have `column_names.len()` cells.
    pub fn from_rows(rows: &[Vec<Real>], column_names: Vec<String>) -> Result<Self> {
        let num_columns = column_names.len();
        let mut flat = Vec::with_capacity(rows.len() * num_columns);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != num_columns {
                return Err(ImputeError::dimension_mismatch(
                    format!("{} cells in row {}", num_columns, i),
                    format!("{} cells", row.len()),
                ));
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((rows.len(), num_columns), flat)
            .map_err(|e| ImputeError::internal(format!("Failed to shape table: {}", e)))?;
        Self::new(data, column_names)
    }

    /// Persist derived statistics under `dir`.
    pub fn with_metadata_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    /// Override the modification signal.
    pub fn with_modification_time(mut self, modified: SystemTime) -> Self {
        self.modified = modified;
        self
    }

    /// Set the input/target/weight partition.
    pub fn with_layout(mut self, layout: ColumnLayout) -> Result<Self> {
        if layout.total() != self.data.ncols() {
            return Err(ImputeError::dimension_mismatch(
                format!("layout covering {} columns", self.data.ncols()),
                format!("layout covering {} columns", layout.total()),
            ));
        }
        self.layout = layout;
        Ok(self)
    }

    /// Underlying matrix.
    pub fn data(&self) -> &Array2<Real> {
        &self.data
    }
}

impl TableView for MemoryTable {
    fn num_rows(&self) -> usize {
        self.data.nrows()
    }

    fn num_columns(&self) -> usize {
        self.data.ncols()
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn layout(&self) -> ColumnLayout {
        self.layout
    }

    fn get(&self, row: usize, col: usize) -> Result<Real> {
        check_cell(self, row, col)?;
        Ok(self.data[[row, col]])
    }

    fn get_sub_row(&self, row: usize, start: usize, len: usize) -> Result<Array1<Real>> {
        check_sub_row(self, row, start, len)?;
        Ok(self.data.slice(s![row, start..start + len]).to_owned())
    }

    fn get_column(&self, col: usize) -> Result<Array1<Real>> {
        check_column(self, col)?;
        Ok(self.data.column(col).to_owned())
    }

    fn modification_time(&self) -> Option<SystemTime> {
        Some(self.modified)
    }

    fn metadata_dir(&self) -> Option<&Path> {
        self.metadata_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accessors() {
        let table = MemoryTable::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.column_names(), &["col0", "col1", "col2"]);
        assert_eq!(table.get(1, 2).unwrap(), 6.0);
        assert_eq!(table.get_row(0).unwrap(), array![1.0, 2.0, 3.0]);
        assert_eq!(table.get_sub_row(1, 1, 2).unwrap(), array![5.0, 6.0]);
        assert_eq!(table.get_column(1).unwrap(), array![2.0, 5.0]);
        assert_eq!(table.column_index("col2"), Some(2));
    }

    #[test]
    fn test_out_of_bounds() {
        let table = MemoryTable::from_array(array![[1.0, 2.0]]);
        assert!(matches!(
            table.get(1, 0),
            Err(ImputeError::IndexOutOfBounds { index: 1, length: 1 })
        ));
        assert!(table.get_sub_row(0, 1, 2).is_err());
        assert!(table.get_column(2).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert!(MemoryTable::from_rows(&[vec![1.0, 2.0], vec![3.0]], names.clone()).is_err());
        let table = MemoryTable::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]], names).unwrap();
        assert_eq!(table.get(1, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_layout_must_cover_columns() {
        let table = MemoryTable::from_array(array![[1.0, 2.0, 3.0]]);
        let layout = ColumnLayout {
            input_width: 2,
            target_width: 1,
            weight_width: 0,
        };
        let table = table.with_layout(layout).unwrap();
        assert_eq!(table.layout().target_width, 1);
        let bad = ColumnLayout::all_inputs(5);
        assert!(table.with_layout(bad).is_err());
    }
}
