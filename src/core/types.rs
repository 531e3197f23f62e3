//! Core data types for tabimpute.

use crate::core::error::{ImputeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cell value type. Missing cells hold [`MISSING_VALUE`](crate::core::constants::MISSING_VALUE).
pub type Real = f64;

/// Partition of a table's columns into input, target and weight blocks.
///
/// Purely descriptive: views carry it through so downstream consumers know
/// where the targets start, but nothing in this crate interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Number of leading input columns
    pub input_width: usize,
    /// Number of target columns following the inputs
    pub target_width: usize,
    /// Number of weight columns following the targets
    pub weight_width: usize,
}

impl ColumnLayout {
    /// Layout where every column is an input.
    pub fn all_inputs(num_columns: usize) -> Self {
        ColumnLayout {
            input_width: num_columns,
            target_width: 0,
            weight_width: 0,
        }
    }

    /// Total number of columns described by the layout.
    pub fn total(&self) -> usize {
        self.input_width + self.target_width + self.weight_width
    }
}

/// Per-column policy applied to a missing cell by the mean/median/mode strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputationInstruction {
    /// Substitute the column mean
    Mean,
    /// Substitute the column median
    Median,
    /// Substitute the column mode
    Mode,
    /// Leave the cell missing
    #[serde(rename = "none")]
    Leave,
    /// Reading the cell is an error
    #[serde(rename = "err")]
    Error,
}

impl ImputationInstruction {
    /// Token used in pattern specifications.
    pub fn token(&self) -> &'static str {
        match self {
            ImputationInstruction::Mean => "mean",
            ImputationInstruction::Median => "median",
            ImputationInstruction::Mode => "mode",
            ImputationInstruction::Leave => "none",
            ImputationInstruction::Error => "err",
        }
    }
}

impl fmt::Display for ImputationInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ImputationInstruction {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(ImputationInstruction::Mean),
            "median" => Ok(ImputationInstruction::Median),
            "mode" => Ok(ImputationInstruction::Mode),
            "none" => Ok(ImputationInstruction::Leave),
            "err" => Ok(ImputationInstruction::Error),
            _ => Err(ImputeError::invalid_parameter(
                "instruction",
                s,
                "expected one of mean, median, mode, none, err",
            )),
        }
    }
}

/// What to do when a pattern of the imputation specification matches no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldAction {
    /// Fail the build, naming every unmatched pattern
    #[default]
    Error,
    /// Log a warning and continue
    Warn,
}

impl fmt::Display for MissingFieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingFieldAction::Error => write!(f, "error"),
            MissingFieldAction::Warn => write!(f, "warn"),
        }
    }
}

impl FromStr for MissingFieldAction {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(MissingFieldAction::Error),
            "warn" | "warning" => Ok(MissingFieldAction::Warn),
            _ => Err(ImputeError::invalid_parameter(
                "missing_field_action",
                s,
                "expected error or warn",
            )),
        }
    }
}
