//! Imputation strategy integration tests.

use approx::assert_relative_eq;
use ndarray::{array, Array2};
use std::sync::Arc;
use tabimpute::*;

mod common;
use common::*;

fn mean_config() -> MeanMedianModeConfig {
    MeanMedianModeConfigBuilder::new()
        .default_instruction("mean")
        .build()
        .unwrap()
}

#[test]
fn test_mean_median_mode_never_overwrites_observed_cells() {
    let source: SharedView = Arc::new(MemoryTable::from_array(create_test_table_with_missing(40, 5, 0.3)));
    let config = MeanMedianModeConfigBuilder::new()
        .instruction("col1", "median")
        .instruction("col2", "mode")
        .instruction("col4", "none")
        .default_instruction("mean")
        .build()
        .unwrap();
    let strategy = MeanMedianModeStrategy::build(source.as_ref(), &config).unwrap();
    let imputed = ImputedView::new(source.clone(), strategy).unwrap();

    assert_observed_cells_unchanged(source.as_ref(), &imputed);
    assert_accessors_consistent(&imputed);
    for col in 0..4 {
        let column = imputed.get_column(col).unwrap();
        assert!(column.iter().all(|v| !v.is_nan()), "column {} still has holes", col);
    }
}

#[test]
fn test_covariance_never_overwrites_observed_cells() {
    let source: SharedView = Arc::new(MemoryTable::from_array(create_test_table_with_missing(40, 4, 0.25)));
    let strategy = CovariancePreservationStrategy::build(source.as_ref()).unwrap();
    let imputed = ImputedView::new(source.clone(), strategy).unwrap();

    assert_observed_cells_unchanged(source.as_ref(), &imputed);
    assert_accessors_consistent(&imputed);
}

#[test]
fn test_neighborhood_never_overwrites_observed_cells() {
    let reference_data = create_test_table_with_missing(10, 3, 0.3);
    let fallback_data = reference_data.mapv(|v| if v.is_nan() { 0.5 } else { v });
    let reference: SharedView = Arc::new(MemoryTable::from_array(reference_data));
    let fallback: SharedView = Arc::new(MemoryTable::from_array(fallback_data));
    let index = MemoryTable::from_array(Array2::from_shape_fn((10, 3), |(r, k)| ((r + k + 1) % 10) as f64));

    let strategy = NeighborhoodStrategy::from_config(
        &index,
        reference.clone(),
        fallback,
        &NeighborhoodConfig { neighbor_count: 2 },
    )
    .unwrap();
    let imputed = ImputedView::new(reference.clone(), strategy).unwrap();

    assert_observed_cells_unchanged(reference.as_ref(), &imputed);
    assert_accessors_consistent(&imputed);
    for row in 0..imputed.num_rows() {
        assert!(imputed.get_row(row).unwrap().iter().all(|v| !v.is_nan()));
    }
}

#[test]
fn test_constant_column_statistics_agree() {
    let table = MemoryTable::from_array(array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0], [5.0, f64::NAN]]);
    let strategy = MeanMedianModeStrategy::build(&table, &mean_config()).unwrap();
    assert_eq!(strategy.mean()[0], 5.0);
    assert_eq!(strategy.median()[0], 5.0);
    assert_eq!(strategy.mode()[0], 5.0);

    let imputed = ImputedView::new(Arc::new(table), strategy).unwrap();
    assert_relative_eq!(imputed.get(3, 1).unwrap(), 2.0);
}

#[test]
fn test_error_instruction_raises_on_access_only() {
    let source: SharedView = Arc::new(MemoryTable::from_array(array![[1.0, 2.0], [f64::NAN, 4.0]]));
    let config = MeanMedianModeConfigBuilder::new()
        .instruction("col0", "err")
        .default_instruction("mean")
        .build()
        .unwrap();
    let strategy = MeanMedianModeStrategy::build(source.as_ref(), &config).unwrap();
    let imputed = ImputedView::new(source, strategy).unwrap();

    assert_eq!(imputed.get(0, 0).unwrap(), 1.0);
    assert_eq!(imputed.get(1, 1).unwrap(), 4.0);
    assert!(matches!(imputed.get(1, 0), Err(ImputeError::Data { row: 1, .. })));
    assert!(imputed.get_row(1).is_err());
    assert!(imputed.get_column(0).is_err());
    assert!(imputed.get_column(1).is_ok());
}

#[test]
fn test_strategy_shared_with_held_out_rows() {
    let data = create_test_correlated_table(60, 3);
    let raw: SharedView = Arc::new(MemoryTable::from_array(data.clone()));
    let train = RemoveRowsView::new(raw, 50..60).unwrap();
    let strategy = Arc::new(CovariancePreservationStrategy::build(&train).unwrap());

    let mut held_out = data.clone();
    for row in 50..60 {
        held_out[[row, 2]] = f64::NAN;
    }
    let test: SharedView = Arc::new(
        SelectRowsView::new(Arc::new(MemoryTable::from_array(held_out)), (50..60).collect()).unwrap(),
    );
    let imputed = ImputedView::with_shared(test.clone(), strategy.clone()).unwrap();
    let again = ImputedView::with_shared(test, strategy).unwrap();

    for row in 0..10 {
        let value = imputed.get(row, 2).unwrap();
        assert!(value.is_finite());
        assert_eq!(value, again.get(row, 2).unwrap());
        assert_eq!(imputed.get(row, 0).unwrap(), data[[50 + row, 0]]);
    }
}

#[test]
fn test_mismatched_source_rejected_at_bind_time() {
    let train = MemoryTable::from_array(array![[1.0, 2.0]]);
    let strategy = MeanMedianModeStrategy::build(&train, &mean_config()).unwrap();
    let other: SharedView = Arc::new(MemoryTable::from_array(array![[1.0, 2.0, 3.0]]));
    assert!(matches!(
        ImputedView::new(other, strategy),
        Err(ImputeError::DimensionMismatch { .. })
    ));
}
