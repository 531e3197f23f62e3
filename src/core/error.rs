//! Error handling and error types for tabimpute.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`ImputeError`]. Errors are never swallowed internally: configuration
//! problems surface at build time, data problems at access time, and
//! consistency problems whenever a persisted artifact disagrees with the table
//! it is supposed to describe.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tabimpute library.
#[derive(Error, Debug)]
pub enum ImputeError {
    /// Configuration and validation errors raised while building a strategy
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A read request hit a cell that cannot be served
    #[error("Data error at row {row}, column '{column}': {message}")]
    Data {
        row: usize,
        column: String,
        message: String,
    },

    /// A persisted artifact does not describe the table it was loaded for
    #[error("Consistency error in {}: {message}", path.display())]
    Consistency { path: PathBuf, message: String },

    /// Column or row shape disagreement between composed views
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Sorting failures
    #[error("Sort error: {source}")]
    Sort {
        #[from]
        source: SortError,
    },

    /// Statistics cache failures
    #[error("Cache error: {source}")]
    Cache {
        #[from]
        source: CacheError,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Bincode serialization errors
    #[error("Bincode error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised by the column sorter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("partition stack overflow: capacity {capacity} exhausted while sorting {len} values")]
    StackOverflow { capacity: usize, len: usize },

    #[error("invalid sort range {start}..{end} for {len} values")]
    InvalidRange { start: usize, end: usize, len: usize },
}

/// Errors raised by the statistics cache protocol.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to lock metadata directory {}: {source}", dir.display())]
    Lock { dir: PathBuf, source: io::Error },

    #[error("artifact {} is unreadable: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("unsupported artifact format version {found} (expected {expected})")]
    FormatVersion { found: u32, expected: u32 },
}

/// Type alias for Results using ImputeError
pub type Result<T> = std::result::Result<T, ImputeError>;

impl ImputeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ImputeError::Config {
            message: message.into(),
        }
    }

    /// Create a data error for a specific cell
    pub fn data<C, S>(row: usize, column: C, message: S) -> Self
    where
        C: Into<String>,
        S: Into<String>,
    {
        ImputeError::Data {
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a consistency error for a persisted artifact
    pub fn consistency<P, S>(path: P, message: S) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        ImputeError::Consistency {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        ImputeError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        ImputeError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        ImputeError::IndexOutOfBounds { index, length }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        ImputeError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ImputeError::Config { .. } => false,
            ImputeError::Data { .. } => false,
            ImputeError::Consistency { .. } => false,
            ImputeError::DimensionMismatch { .. } => false,
            ImputeError::IndexOutOfBounds { .. } => false,
            ImputeError::InvalidParameter { .. } => false,
            ImputeError::Sort { .. } => false,
            // Another process may finish its build and release the directory.
            ImputeError::Cache { .. } => true,
            ImputeError::IO { .. } => true,
            ImputeError::Csv { .. } => false,
            ImputeError::Json { .. } => false,
            ImputeError::Bincode { .. } => false,
            ImputeError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ImputeError::Config { .. } => "config",
            ImputeError::Data { .. } => "data",
            ImputeError::Consistency { .. } => "consistency",
            ImputeError::DimensionMismatch { .. } => "dimension_mismatch",
            ImputeError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            ImputeError::InvalidParameter { .. } => "invalid_parameter",
            ImputeError::Sort { .. } => "sort",
            ImputeError::Cache { .. } => "cache",
            ImputeError::IO { .. } => "io",
            ImputeError::Csv { .. } => "csv",
            ImputeError::Json { .. } => "json",
            ImputeError::Bincode { .. } => "bincode",
            ImputeError::Internal { .. } => "internal",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::ImputeError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ImputeError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! data_error {
    ($row:expr, $column:expr, $msg:expr) => {
        $crate::core::error::ImputeError::data($row, $column, $msg)
    };
    ($row:expr, $column:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ImputeError::data($row, $column, format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ImputeError::config("no policy for column 'age'");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());

        let err = ImputeError::data(3, "age", "policy is err");
        assert_eq!(err.category(), "data");
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("'age'"));
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("test error");
        assert!(matches!(err, ImputeError::Config { .. }));

        let err = data_error!(7, "x", "bad neighbour index {}", 42);
        match err {
            ImputeError::Data { row, column, message } => {
                assert_eq!(row, 7);
                assert_eq!(column, "x");
                assert!(message.contains("42"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_specialized_errors() {
        let sort_err = SortError::StackOverflow { capacity: 50, len: 10 };
        let err: ImputeError = sort_err.into();
        assert_eq!(err.category(), "sort");
        assert!(err.to_string().contains("capacity 50"));

        let cache_err = CacheError::FormatVersion { found: 9, expected: 1 };
        let err: ImputeError = cache_err.into();
        assert_eq!(err.category(), "cache");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_consistency_display() {
        let err = ImputeError::consistency("/tmp/meta/stats.bin", "field names differ");
        let msg = format!("{}", err);
        assert!(msg.contains("/tmp/meta/stats.bin"));
        assert!(msg.contains("field names differ"));
    }

    #[test]
    fn test_ensure_macro() {
        fn positive(value: i32) -> Result<i32> {
            ensure!(value > 0, ImputeError::invalid_parameter("value", value.to_string(), "must be positive"));
            Ok(value)
        }
        assert_eq!(positive(3).unwrap(), 3);
        assert_eq!(positive(-1).unwrap_err().category(), "invalid_parameter");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1,").unwrap_err();
        let err: ImputeError = json_err.into();
        assert_eq!(err.category(), "json");
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ImputeError = io_err.into();
        assert!(matches!(err, ImputeError::IO { .. }));
        assert_eq!(err.category(), "io");
    }
}
