//! Per-column order statistics computed from a sorted sample.

use crate::core::error::Result;
use crate::core::missing::is_missing;
use crate::core::types::Real;
use crate::stats::sort::ColumnSorter;
use serde::{Deserialize, Serialize};

/// Mean, median and mode of the present values of one column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Arithmetic mean of the present values
    pub mean: Real,
    /// Element at rank `present / 2` of the sorted present values
    pub median: Real,
    /// Head of the longest run of equal sorted values (first run wins ties)
    pub mode: Real,
    /// Number of present values
    pub present: usize,
}

impl ColumnSummary {
    /// Whether the column had no present value at all.
    pub fn is_empty(&self) -> bool {
        self.present == 0
    }
}

/// Sort `values` in place and summarize them.
///
/// A column without present values keeps mean, median and mode at zero.
pub fn summarize_column(values: &mut [Real], sorter: &ColumnSorter) -> Result<ColumnSummary> {
    sorter.sort_all(values)?;

    // Missing values form a suffix after sorting.
    let present = values.iter().take_while(|v| !is_missing(**v)).count();
    if present == 0 {
        return Ok(ColumnSummary::default());
    }
    let sorted = &values[..present];

    let mean = sorted.iter().sum::<Real>() / present as Real;
    let median = sorted[present / 2];

    let mut mode = sorted[0];
    let mut best_run = 0usize;
    let mut run_start = 0usize;
    for i in 1..=present {
        if i == present || sorted[i] != sorted[run_start] {
            let run = i - run_start;
            if run > best_run {
                best_run = run;
                mode = sorted[run_start];
            }
            run_start = i;
        }
    }

    Ok(ColumnSummary {
        mean,
        median,
        mode,
        present,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::MISSING_VALUE;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_column() {
        let mut values = vec![5.0; 9];
        let summary = summarize_column(&mut values, &ColumnSorter::new()).unwrap();
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.median, 5.0);
        assert_eq!(summary.mode, 5.0);
        assert_eq!(summary.present, 9);
    }

    #[test]
    fn test_missing_values_ignored() {
        let mut values = vec![1.0, 2.0, 3.0, MISSING_VALUE];
        let summary = summarize_column(&mut values, &ColumnSorter::new()).unwrap();
        assert_relative_eq!(summary.mean, 2.0);
        assert_eq!(summary.median, 2.0);
        assert_eq!(summary.present, 3);
    }

    #[test]
    fn test_median_upper_middle_for_even_count() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        let summary = summarize_column(&mut values, &ColumnSorter::new()).unwrap();
        assert_eq!(summary.median, 3.0);
    }

    #[test]
    fn test_mode_ties_take_first_run() {
        let mut values = vec![7.0, 2.0, 7.0, 2.0, 9.0];
        let summary = summarize_column(&mut values, &ColumnSorter::new()).unwrap();
        assert_eq!(summary.mode, 2.0);

        let mut values = vec![7.0, 2.0, 7.0, 7.0, 9.0, MISSING_VALUE, MISSING_VALUE];
        let summary = summarize_column(&mut values, &ColumnSorter::new()).unwrap();
        assert_eq!(summary.mode, 7.0);
    }

    #[test]
    fn test_empty_column() {
        let mut values = vec![MISSING_VALUE; 3];
        let summary = summarize_column(&mut values, &ColumnSorter::new()).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.median, 0.0);
        assert_eq!(summary.mode, 0.0);
    }
}
