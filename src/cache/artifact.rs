//! Persisted statistics artifacts.
//!
//! An artifact is a rectangular block of numbers (one row per statistic)
//! tagged with the column names it was computed for. It is written to a
//! temporary sibling file and renamed into place, so a reader sees either the
//! previous artifact or the complete new one.

use crate::core::constants::{ARTIFACT_EXTENSION, ARTIFACT_FORMAT_VERSION};
use crate::core::error::{CacheError, ImputeError, Result};
use crate::core::types::Real;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Statistics block with the header needed to validate it on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsArtifact {
    version: u32,
    field_names: Vec<String>,
    rows: usize,
    cols: usize,
    built_at: DateTime<Utc>,
    data: Array2<Real>,
}

impl StatsArtifact {
    /// New artifact over `data`, whose columns are named by `field_names`.
    pub fn new(field_names: Vec<String>, data: Array2<Real>) -> Result<Self> {
        if field_names.len() != data.ncols() {
            return Err(ImputeError::dimension_mismatch(
                format!("{} field names", data.ncols()),
                format!("{} field names", field_names.len()),
            ));
        }
        Ok(StatsArtifact {
            version: ARTIFACT_FORMAT_VERSION,
            rows: data.nrows(),
            cols: data.ncols(),
            field_names,
            built_at: Utc::now(),
            data,
        })
    }

    /// Format version recorded in the header.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Column names the statistics were computed for.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of statistic rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// When the statistics were computed.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Statistics block.
    pub fn data(&self) -> &Array2<Real> {
        &self.data
    }

    /// Take the statistics block.
    pub fn into_data(self) -> Array2<Real> {
        self.data
    }

    /// Atomically write the artifact to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let temp = temp_path_for(path);
        let written = self.write_to(&temp).and_then(|()| {
            std::fs::rename(&temp, path)?;
            Ok(())
        });
        if written.is_err() {
            let _ = std::fs::remove_file(&temp);
        }
        written
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Read an artifact without checking it against any table.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let artifact: StatsArtifact = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| CacheError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if artifact.version != ARTIFACT_FORMAT_VERSION {
            return Err(CacheError::FormatVersion {
                found: artifact.version,
                expected: ARTIFACT_FORMAT_VERSION,
            }
            .into());
        }
        if artifact.data.dim() != (artifact.rows, artifact.cols)
            || artifact.field_names.len() != artifact.cols
        {
            return Err(CacheError::Unreadable {
                path: path.to_path_buf(),
                reason: format!(
                    "header declares {}x{} with {} names, data is {}x{}",
                    artifact.rows,
                    artifact.cols,
                    artifact.field_names.len(),
                    artifact.data.nrows(),
                    artifact.data.ncols()
                ),
            }
            .into());
        }
        Ok(artifact)
    }

    /// Check that the artifact was computed for `expected_names` and holds
    /// `expected_rows` statistics.
    pub fn validate(&self, path: &Path, expected_names: &[String], expected_rows: usize) -> Result<()> {
        if self.rows != expected_rows {
            return Err(ImputeError::consistency(
                path,
                format!("expected {} statistic rows, found {}", expected_rows, self.rows),
            ));
        }
        if self.field_names != expected_names {
            let differing: Vec<String> = self
                .field_names
                .iter()
                .zip(expected_names)
                .filter(|(found, expected)| found != expected)
                .map(|(found, expected)| format!("'{}' != '{}'", found, expected))
                .collect();
            return Err(ImputeError::consistency(
                path,
                format!(
                    "field names do not match the table ({} vs {} columns; {})",
                    self.field_names.len(),
                    expected_names.len(),
                    differing.join(", ")
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for StatsArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "format version: {}", self.version)?;
        writeln!(f, "built at:       {}", self.built_at.to_rfc3339())?;
        writeln!(f, "shape:          {} x {}", self.rows, self.cols)?;
        write!(f, "fields:         {}", self.field_names.join(", "))
    }
}

/// Read the artifact at `path` and check it against the current table.
pub fn load_artifact(path: &Path, expected_names: &[String], expected_rows: usize) -> Result<StatsArtifact> {
    let artifact = StatsArtifact::read(path)?;
    artifact.validate(path, expected_names, expected_rows)?;
    Ok(artifact)
}

/// Path of the artifact `stem` inside `dir`.
pub fn artifact_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.{}", stem, ARTIFACT_EXTENSION))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".tmp{}", std::process::id()));
    PathBuf::from(name)
}
