//! In-place column sorter with a missing-last ordering.
//!
//! Quicksort with median-of-three pivot selection and Hoare-style
//! partitioning. Short partitions are finished with insertion sort and the
//! recursion is replaced by an explicit stack of bounded capacity, so running
//! out of stack is reported as an error rather than overflowing the thread.

use crate::core::constants::{DEFAULT_SORT_STACK_CAPACITY, SORT_INSERTION_THRESHOLD};
use crate::core::error::{Result, SortError};
use crate::core::missing::less_missing_last;
use crate::core::types::Real;

/// Sorter for columns of [`Real`] values that may contain missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSorter {
    stack_capacity: usize,
}

impl Default for ColumnSorter {
    fn default() -> Self {
        ColumnSorter {
            stack_capacity: DEFAULT_SORT_STACK_CAPACITY,
        }
    }
}

impl ColumnSorter {
    /// Sorter with the default stack capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorter with a custom partition stack capacity (in slots, two per pending partition).
    pub fn with_stack_capacity(stack_capacity: usize) -> Self {
        ColumnSorter { stack_capacity }
    }

    /// Stack capacity in slots.
    pub fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }

    /// Sort the whole slice.
    pub fn sort_all(&self, values: &mut [Real]) -> Result<()> {
        self.sort(values, 0, values.len())
    }

    /// Sort `values[start..end)` ascending, missing values last.
    pub fn sort(&self, values: &mut [Real], start: usize, end: usize) -> Result<()> {
        if start > end || end > values.len() {
            return Err(SortError::InvalidRange {
                start,
                end,
                len: values.len(),
            }
            .into());
        }
        if end - start < 2 {
            return Ok(());
        }

        let a = values;
        let mut stack: Vec<usize> = Vec::with_capacity(self.stack_capacity);
        let mut l = start;
        let mut ir = end - 1;

        loop {
            if is_short_partition(l, ir) {
                insertion_sort(a, l, ir);
                match (stack.pop(), stack.pop()) {
                    (Some(left), Some(right)) => {
                        l = left;
                        ir = right;
                    }
                    _ => break,
                }
            } else {
                // Median of a[l], a[mid], a[ir] ends up in a[l + 1]; a[l] and
                // a[ir] become sentinels for the partition scans.
                let mid = l + (ir - l) / 2;
                a.swap(mid, l + 1);
                if less_missing_last(a[ir], a[l]) {
                    a.swap(l, ir);
                }
                if less_missing_last(a[ir], a[l + 1]) {
                    a.swap(l + 1, ir);
                }
                if less_missing_last(a[l + 1], a[l]) {
                    a.swap(l, l + 1);
                }

                let pivot = a[l + 1];
                let mut i = l + 1;
                let mut j = ir;
                loop {
                    i += 1;
                    while less_missing_last(a[i], pivot) {
                        i += 1;
                    }
                    j -= 1;
                    while less_missing_last(pivot, a[j]) {
                        j -= 1;
                    }
                    if j < i {
                        break;
                    }
                    a.swap(i, j);
                }
                a[l + 1] = a[j];
                a[j] = pivot;

                if stack.len() + 2 > self.stack_capacity {
                    return Err(SortError::StackOverflow {
                        capacity: self.stack_capacity,
                        len: end - start,
                    }
                    .into());
                }

                // Defer the larger side, continue with the smaller one.
                if ir + 1 - i >= j - l {
                    stack.push(ir);
                    stack.push(i);
                    ir = j - 1;
                } else {
                    stack.push(j - 1);
                    stack.push(l);
                    l = i;
                }
            }
        }

        Ok(())
    }
}

/// Whether the inclusive range `lo..=hi` holds fewer than
/// [`SORT_INSERTION_THRESHOLD`] elements.
fn is_short_partition(lo: usize, hi: usize) -> bool {
    hi + 1 - lo < SORT_INSERTION_THRESHOLD
}

/// Insertion sort of the inclusive range `a[lo..=hi]`.
fn insertion_sort(a: &mut [Real], lo: usize, hi: usize) {
    for j in (lo + 1)..=hi {
        let value = a[j];
        let mut i = j;
        while i > lo && less_missing_last(value, a[i - 1]) {
            a[i] = a[i - 1];
            i -= 1;
        }
        a[i] = value;
    }
}

/// Sort `values` with the default sorter.
pub fn sort_missing_last(values: &mut [Real]) -> Result<()> {
    ColumnSorter::default().sort_all(values)
}
