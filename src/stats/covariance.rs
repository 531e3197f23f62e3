//! Pairwise covariance estimation tolerant of partially observed rows.
//!
//! For every ordered column pair `(j, k)` only the rows where both columns
//! are present contribute. The accumulators are kept separately per pair so
//! that a column observed in few rows does not bias the others.

use crate::core::error::{ImputeError, Result};
use crate::core::missing::is_missing;
use crate::core::types::Real;
use ndarray::{Array1, Array2, ArrayView1};

/// Running sums over co-observed column pairs.
#[derive(Debug, Clone)]
pub struct PairwiseMoments {
    /// `count[[j, k]]`: rows where both `j` and `k` are present
    count: Array2<Real>,
    /// `sum[[j, k]]`: sum of column `j` over those rows
    sum: Array2<Real>,
    /// `sum_product[[j, k]]`: sum of `x_j * x_k` over those rows
    sum_product: Array2<Real>,
}

/// Estimated column means and covariance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceEstimate {
    /// Column means, `mu[k] = sum[[k, k]] / count[[k, k]]`
    pub mu: Array1<Real>,
    /// Covariance matrix, `num_columns x num_columns`
    pub cov: Array2<Real>,
}

impl PairwiseMoments {
    /// Empty accumulators for `num_columns` columns.
    pub fn new(num_columns: usize) -> Self {
        PairwiseMoments {
            count: Array2::zeros((num_columns, num_columns)),
            sum: Array2::zeros((num_columns, num_columns)),
            sum_product: Array2::zeros((num_columns, num_columns)),
        }
    }

    /// Number of columns tracked.
    pub fn num_columns(&self) -> usize {
        self.count.nrows()
    }

    /// Accumulate one row.
    pub fn accumulate(&mut self, row: &ArrayView1<'_, Real>) {
        let present: Vec<usize> = row
            .iter()
            .enumerate()
            .filter(|(_, v)| !is_missing(**v))
            .map(|(j, _)| j)
            .collect();

        for &j in &present {
            let xj = row[j];
            for &k in &present {
                self.count[[j, k]] += 1.0;
                self.sum[[j, k]] += xj;
                self.sum_product[[j, k]] += xj * row[k];
            }
        }
    }

    /// Co-observation count of the pair `(j, k)`.
    pub fn count(&self, j: usize, k: usize) -> Real {
        self.count[[j, k]]
    }

    /// Turn the sums into means and covariances.
    ///
    /// A column never observed gets mean zero; a pair never co-observed gets
    /// covariance zero.
    pub fn estimate(&self) -> CovarianceEstimate {
        let n = self.num_columns();
        let mut mu = Array1::zeros(n);
        for k in 0..n {
            let count = self.count[[k, k]];
            if count > 0.0 {
                mu[k] = self.sum[[k, k]] / count;
            }
        }

        let mut cov = Array2::zeros((n, n));
        for j in 0..n {
            for k in 0..n {
                let count = self.count[[j, k]];
                if count > 0.0 {
                    cov[[j, k]] = (self.sum_product[[j, k]]
                        - self.sum[[j, k]] * mu[k]
                        - self.sum[[k, j]] * mu[j])
                        / count
                        + mu[k] * mu[j];
                }
            }
        }

        CovarianceEstimate { mu, cov }
    }
}

impl CovarianceEstimate {
    /// Least-squares projection of the missing `col` of `row` onto the
    /// estimated linear relation with the row's other present columns.
    ///
    /// Returns exactly `mu[col]` when no other column contributes. `row` must
    /// have one cell per estimated column.
    pub fn project(&self, row: &[Real], col: usize) -> Result<Real> {
        if row.len() != self.mu.len() {
            return Err(ImputeError::dimension_mismatch(
                format!("{} cells per row", self.mu.len()),
                format!("{} cells", row.len()),
            ));
        }
        if col >= self.mu.len() {
            return Err(ImputeError::index_out_of_bounds(col, self.mu.len()));
        }

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (l, &x) in row.iter().enumerate() {
            if l == col || is_missing(x) {
                continue;
            }
            let centered = x - self.mu[l];
            numerator += self.cov[[l, col]] * centered;
            denominator += centered * centered;
        }

        if denominator == 0.0 {
            Ok(self.mu[col])
        } else {
            Ok(self.mu[col] + numerator / denominator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::MISSING_VALUE;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_fully_observed_matches_population_covariance() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let mut moments = PairwiseMoments::new(2);
        for row in data.rows() {
            moments.accumulate(&row);
        }
        let estimate = moments.estimate();
        assert_relative_eq!(estimate.mu[0], 2.0);
        assert_relative_eq!(estimate.mu[1], 4.0);
        assert_relative_eq!(estimate.cov[[0, 0]], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(estimate.cov[[0, 1]], 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(estimate.cov[[1, 1]], 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_rows_only_count_coobserved_pairs() {
        let data = array![[1.0, MISSING_VALUE], [3.0, 1.0], [MISSING_VALUE, 3.0]];
        let mut moments = PairwiseMoments::new(2);
        for row in data.rows() {
            moments.accumulate(&row);
        }
        assert_eq!(moments.count(0, 0), 2.0);
        assert_eq!(moments.count(0, 1), 1.0);
        assert_eq!(moments.count(1, 1), 2.0);
        let estimate = moments.estimate();
        assert_relative_eq!(estimate.mu[0], 2.0);
        assert_relative_eq!(estimate.mu[1], 2.0);
    }

    #[test]
    fn test_estimate_is_symmetric() {
        let data = array![
            [1.0, 5.0, MISSING_VALUE],
            [2.0, MISSING_VALUE, 1.0],
            [MISSING_VALUE, 3.0, 2.0],
            [4.0, 1.0, 7.0]
        ];
        let mut moments = PairwiseMoments::new(3);
        for row in data.rows() {
            moments.accumulate(&row);
        }
        let estimate = moments.estimate();
        for j in 0..3 {
            for k in 0..3 {
                assert_relative_eq!(estimate.cov[[j, k]], estimate.cov[[k, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_project_falls_back_to_mean() {
        let estimate = CovarianceEstimate {
            mu: array![1.5, -2.0],
            cov: array![[1.0, 0.5], [0.5, 1.0]],
        };
        assert_eq!(estimate.project(&[MISSING_VALUE, MISSING_VALUE], 0).unwrap(), 1.5);
        // Other column present but exactly at its mean: zero denominator.
        assert_eq!(estimate.project(&[MISSING_VALUE, -2.0], 0).unwrap(), 1.5);
    }

    #[test]
    fn test_project_uses_covariance() {
        let estimate = CovarianceEstimate {
            mu: array![0.0, 0.0],
            cov: array![[1.0, 2.0], [2.0, 4.0]],
        };
        // num = cov(1,0) * 1 = 2, den = 1
        assert_relative_eq!(estimate.project(&[MISSING_VALUE, 1.0], 0).unwrap(), 2.0);
    }
}
