//! System constants for tabimpute.

use crate::core::types::Real;
use static_assertions::const_assert;

/// Sentinel stored in a cell that holds no value.
pub const MISSING_VALUE: Real = Real::NAN;

/// Partitions shorter than this are finished with insertion sort.
pub const SORT_INSERTION_THRESHOLD: usize = 7;

/// Default capacity of the explicit partition stack used by the column sorter.
/// Two slots are consumed per pending partition.
pub const DEFAULT_SORT_STACK_CAPACITY: usize = 50;

const_assert!(DEFAULT_SORT_STACK_CAPACITY >= 50);
const_assert!(SORT_INSERTION_THRESHOLD >= 3);

/// Name of the advisory lock file created inside a metadata directory.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Extension of persisted statistics artifacts.
pub const ARTIFACT_EXTENSION: &str = "stats";

/// Version tag written in every artifact header.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Artifact stem used by the mean/median/mode strategy.
pub const MEAN_MEDIAN_MODE_ARTIFACT: &str = "mean_median_mode";

/// Artifact stem used by the covariance-preserving strategy.
pub const COVARIANCE_ARTIFACT: &str = "covariance_preservation";

/// Suffix appended to a CSV path to form its metadata directory.
pub const METADATA_DIR_SUFFIX: &str = ".metadata";

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "TABIMPUTE_";

/// Crate version string.
pub const TABIMPUTE_VERSION: &str = env!("CARGO_PKG_VERSION");
