//! Common test utilities for tabimpute integration tests.

#![allow(dead_code)]

use ndarray::Array2;
use rand::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabimpute::*;

/// Column names `name_0, name_1, ...`.
pub fn create_test_column_names(prefix: &str, num_columns: usize) -> Vec<String> {
    (0..num_columns).map(|i| format!("{}_{}", prefix, i)).collect()
}

/// Random table with every cell in `[-5, 5)`.
pub fn create_test_table(num_rows: usize, num_columns: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    Array2::from_shape_fn((num_rows, num_columns), |_| rng.gen_range(-5.0..5.0))
}

/// Random table where each cell is missing with probability `missing_rate`.
///
/// Row 0 is always fully observed so every column has at least one value.
pub fn create_test_table_with_missing(
    num_rows: usize,
    num_columns: usize,
    missing_rate: f64,
) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(999);
    Array2::from_shape_fn((num_rows, num_columns), |(row, _)| {
        if row > 0 && rng.gen::<f64>() < missing_rate {
            f64::NAN
        } else {
            rng.gen_range(-3.0..3.0)
        }
    })
}

/// Correlated table: column `j` is `(j + 1) * x + noise` for a shared `x`.
pub fn create_test_correlated_table(num_rows: usize, num_columns: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut data = Array2::zeros((num_rows, num_columns));
    for i in 0..num_rows {
        let x: f64 = rng.gen_range(-2.0..2.0);
        for j in 0..num_columns {
            data[[i, j]] = (j + 1) as f64 * x + rng.gen_range(-0.01..0.01);
        }
    }
    data
}

/// Write `data` as CSV with a header row; missing cells become empty fields.
pub fn create_test_csv<P: AsRef<Path>>(
    path: P,
    data: &Array2<f64>,
    column_names: &[String],
) -> std::io::Result<()> {
    let mut content = column_names.join(",");
    content.push('\n');
    for row in data.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|v| if v.is_nan() { String::new() } else { v.to_string() })
            .collect();
        content.push_str(&cells.join(","));
        content.push('\n');
    }
    fs::write(path, content)
}

/// Write `data` to `<dir>/<name>` and load it back as a CSV-backed table.
pub fn create_test_csv_table(dir: &Path, name: &str, data: &Array2<f64>) -> (PathBuf, SharedView) {
    let path = dir.join(name);
    let names = create_test_column_names("c", data.ncols());
    create_test_csv(&path, data, &names).expect("write test csv");
    let table = MemoryTable::from_csv(&path).expect("load test csv");
    (path, Arc::new(table))
}

/// Assert that every observed cell of `source` is returned unchanged by `imputed`.
pub fn assert_observed_cells_unchanged(source: &dyn TableView, imputed: &dyn TableView) {
    assert_eq!(source.num_rows(), imputed.num_rows());
    assert_eq!(source.num_columns(), imputed.num_columns());
    for row in 0..source.num_rows() {
        let imputed_row = imputed.get_row(row).unwrap();
        for col in 0..source.num_columns() {
            let original = source.get(row, col).unwrap();
            if !original.is_nan() {
                assert_eq!(imputed_row[col], original, "cell ({}, {}) overwritten", row, col);
                assert_eq!(imputed.get(row, col).unwrap(), original);
            }
        }
    }
}

/// Assert that `get`, `get_row`, `get_sub_row` and `get_column` agree cell by cell.
pub fn assert_accessors_consistent(view: &dyn TableView) {
    let columns: Vec<_> = (0..view.num_columns())
        .map(|col| view.get_column(col).unwrap())
        .collect();
    for row in 0..view.num_rows() {
        let full = view.get_row(row).unwrap();
        let tail = view.get_sub_row(row, 1, view.num_columns() - 1).unwrap();
        for col in 0..view.num_columns() {
            let cell = view.get(row, col).unwrap();
            assert!(same(cell, full[col]), "get_row differs at ({}, {})", row, col);
            assert!(same(cell, columns[col][row]), "get_column differs at ({}, {})", row, col);
            if col > 0 {
                assert!(same(cell, tail[col - 1]), "get_sub_row differs at ({}, {})", row, col);
            }
        }
    }
}

fn same(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}
