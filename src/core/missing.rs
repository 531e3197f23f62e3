//! Missing-value sentinel helpers and the missing-last total order.

use crate::core::types::Real;
use std::cmp::Ordering;

/// Whether `value` is the missing sentinel.
#[inline]
pub fn is_missing(value: Real) -> bool {
    value.is_nan()
}

/// Total order placing every missing value after every present value.
///
/// Two missing values compare equal; present values compare numerically.
#[inline]
pub fn compare_missing_last(a: Real, b: Real) -> Ordering {
    match (is_missing(a), is_missing(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Strict "less than" under [`compare_missing_last`].
#[inline]
pub fn less_missing_last(a: Real, b: Real) -> bool {
    compare_missing_last(a, b) == Ordering::Less
}

/// Number of present (non-missing) values in `values`.
pub fn count_present(values: &[Real]) -> usize {
    values.iter().filter(|v| !is_missing(**v)).count()
}
