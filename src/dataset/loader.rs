//! CSV import and export.
//!
//! A CSV file is the simplest physical source with a real modification
//! signal: the loaded table takes the file's modification time and uses
//! `<file>.metadata/` as its metadata directory, so statistics derived from it
//! are invalidated whenever the file is rewritten.

use crate::core::constants::{METADATA_DIR_SUFFIX, MISSING_VALUE};
use crate::core::error::{ImputeError, Result};
use crate::core::missing::is_missing;
use crate::core::types::Real;
use crate::dataset::{MemoryTable, TableView};
use csv::{ReaderBuilder, WriterBuilder};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Metadata directory used for a table loaded from `path`.
pub fn metadata_dir_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(METADATA_DIR_SUFFIX);
    PathBuf::from(name)
}

/// Parse a CSV cell. Missing markers give the missing sentinel, text that is
/// neither a marker nor a number gives `None`.
fn parse_cell(value: &str) -> Option<Real> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed == "?"
    {
        return Some(MISSING_VALUE);
    }
    trimmed.parse::<Real>().ok()
}

impl MemoryTable {
    /// Load a CSV file whose first line holds the column names.
    ///
    /// Empty, `NA`, `nan` and `?` cells load as missing; any other
    /// non-numeric cell is an error naming its line and column.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let column_names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let num_columns = column_names.len();

        let mut flat = Vec::new();
        let mut num_rows = 0usize;
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != num_columns {
                return Err(ImputeError::dimension_mismatch(
                    format!("{} fields on line {}", num_columns, i + 2),
                    format!("{} fields", record.len()),
                ));
            }
            for (col, field) in record.iter().enumerate() {
                let value = parse_cell(field).ok_or_else(|| {
                    ImputeError::data(
                        i,
                        column_names[col].clone(),
                        format!("invalid numeric value '{}' on line {}", field, i + 2),
                    )
                })?;
                flat.push(value);
            }
            num_rows += 1;
        }

        let data = Array2::from_shape_vec((num_rows, num_columns), flat)
            .map_err(|e| ImputeError::internal(format!("Failed to shape CSV table: {}", e)))?;
        let modified = std::fs::metadata(path)?.modified()?;

        log::debug!(
            "Loaded {} rows x {} columns from {}",
            num_rows,
            num_columns,
            path.display()
        );

        Ok(MemoryTable::new(data, column_names)?
            .with_metadata_dir(metadata_dir_for(path))
            .with_modification_time(modified))
    }
}

/// Write every row of `view` to `path` as CSV, missing cells as empty fields.
pub fn write_csv<P: AsRef<Path>>(view: &dyn TableView, path: P) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path.as_ref())?;
    writer.write_record(view.column_names())?;
    for row in 0..view.num_rows() {
        let values = view.get_row(row)?;
        let record: Vec<String> = values
            .iter()
            .map(|v| if is_missing(*v) { String::new() } else { v.to_string() })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("1.5"), Some(1.5));
        assert_eq!(parse_cell(" -2 "), Some(-2.0));
        assert!(parse_cell("").unwrap().is_nan());
        assert!(parse_cell("NA").unwrap().is_nan());
        assert!(parse_cell("?").unwrap().is_nan());
        assert_eq!(parse_cell("abc"), None);
    }

    #[test]
    fn test_csv_round_trip_keeps_missing() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("table.csv");
        {
            let mut file = std::fs::File::create(&path)?;
            writeln!(file, "age,height,weight")?;
            writeln!(file, "31,1.8,")?;
            writeln!(file, "NA,1.6,60")?;
        }

        let table = MemoryTable::from_csv(&path)?;
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), &["age", "height", "weight"]);
        assert!(table.get(0, 2)?.is_nan());
        assert!(table.get(1, 0)?.is_nan());
        assert_eq!(table.get(1, 2)?, 60.0);
        assert_eq!(table.metadata_dir(), Some(metadata_dir_for(&path).as_path()));
        assert!(table.modification_time().is_some());

        let out = dir.path().join("copy.csv");
        write_csv(&table, &out)?;
        let reloaded = MemoryTable::from_csv(&out)?;
        assert_eq!(reloaded.get(0, 1)?, 1.8);
        assert!(reloaded.get(0, 2)?.is_nan());
        Ok(())
    }

    #[test]
    fn test_csv_rejects_text_cells() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,hello\n")?;
        let err = MemoryTable::from_csv(&path).unwrap_err();
        assert_eq!(err.category(), "data");
        assert!(err.to_string().contains("hello"));
        Ok(())
    }
}
