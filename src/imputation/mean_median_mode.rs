//! Per-column scalar substitution: column mean, median or mode.

use crate::cache::{memoize, CacheStatus};
use crate::config::{CacheConfig, MeanMedianModeConfig};
use crate::core::constants::MISSING_VALUE;
use crate::core::error::{ImputeError, Result};
use crate::core::types::{ImputationInstruction, MissingFieldAction, Real};
use crate::dataset::TableView;
use crate::imputation::ImputationStrategy;
use crate::stats::{summarize_column, ColumnSorter};
use crate::data_error;
use ndarray::{Array1, Array2};
use std::time::SystemTime;

const MEAN_ROW: usize = 0;
const MEDIAN_ROW: usize = 1;
const MODE_ROW: usize = 2;
const PRESENT_ROW: usize = 3;
const STATISTIC_ROWS: usize = 4;

/// Strategy replacing a missing cell by a statistic of its column, chosen
/// per column.
#[derive(Debug, Clone)]
pub struct MeanMedianModeStrategy {
    column_names: Vec<String>,
    mean: Array1<Real>,
    median: Array1<Real>,
    mode: Array1<Real>,
    instructions: Vec<ImputationInstruction>,
    sample_rows: usize,
    empty_columns: Vec<usize>,
    cache_status: CacheStatus,
    trained_at: Option<SystemTime>,
}

impl MeanMedianModeStrategy {
    /// Build from the leading rows of `training` with the default cache settings.
    pub fn build(training: &dyn TableView, config: &MeanMedianModeConfig) -> Result<Self> {
        Self::build_with_cache(training, config, &CacheConfig::default())
    }

    /// Build from the leading rows of `training`.
    ///
    /// Instructions are resolved first so that a bad instruction list fails
    /// before any statistics are computed.
    pub fn build_with_cache(
        training: &dyn TableView,
        config: &MeanMedianModeConfig,
        cache: &CacheConfig,
    ) -> Result<Self> {
        let instructions = resolve_instructions(training.column_names(), config)?;
        let sample_rows = resolve_sample_rows(config.number_of_train_samples, training.num_rows())?;
        let num_columns = training.num_columns();

        let compute = || -> Result<Array2<Real>> {
            let mut columns: Vec<Vec<Real>> =
                (0..num_columns).map(|_| Vec::with_capacity(sample_rows)).collect();
            for row in 0..sample_rows {
                for (column, value) in columns.iter_mut().zip(training.get_row(row)?.iter()) {
                    column.push(*value);
                }
            }
            compute_statistics(columns)
        };
        let (stats, cache_status) = if cache.enabled {
            let stem = format!("{}.{}rows", cache.mean_median_mode_stem, sample_rows);
            memoize(training, &[], &stem, STATISTIC_ROWS, compute)?
        } else {
            (compute()?, CacheStatus::InMemory)
        };

        let empty_columns: Vec<usize> = stats
            .row(PRESENT_ROW)
            .iter()
            .enumerate()
            .filter(|(_, &present)| present == 0.0)
            .map(|(col, _)| col)
            .collect();
        for &col in &empty_columns {
            log::warn!(
                "Column '{}' has no value in the first {} rows; its statistics default to 0",
                training.column_name(col),
                sample_rows
            );
        }

        log::info!(
            "Built mean/median/mode imputation over {} columns from {} rows ({})",
            num_columns,
            sample_rows,
            cache_status
        );

        Ok(MeanMedianModeStrategy {
            column_names: training.column_names().to_vec(),
            mean: stats.row(MEAN_ROW).to_owned(),
            median: stats.row(MEDIAN_ROW).to_owned(),
            mode: stats.row(MODE_ROW).to_owned(),
            instructions,
            sample_rows,
            empty_columns,
            cache_status,
            trained_at: training.modification_time(),
        })
    }

    /// Column means.
    pub fn mean(&self) -> &Array1<Real> {
        &self.mean
    }

    /// Column medians.
    pub fn median(&self) -> &Array1<Real> {
        &self.median
    }

    /// Column modes.
    pub fn mode(&self) -> &Array1<Real> {
        &self.mode
    }

    /// Resolved instruction of every column.
    pub fn instructions(&self) -> &[ImputationInstruction] {
        &self.instructions
    }

    /// Number of training rows the statistics were computed from.
    pub fn sample_rows(&self) -> usize {
        self.sample_rows
    }

    /// Columns with no present value among the sampled rows.
    pub fn empty_columns(&self) -> &[usize] {
        &self.empty_columns
    }

    /// Whether the statistics were reused, rebuilt or computed in memory.
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }
}

impl ImputationStrategy for MeanMedianModeStrategy {
    fn name(&self) -> &'static str {
        "mean/median/mode"
    }

    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn modification_time(&self) -> Option<SystemTime> {
        self.trained_at
    }

    fn impute(&self, _: &dyn TableView, row: usize, col: usize, _: Option<&[Real]>) -> Result<Real> {
        let instruction = self
            .instructions
            .get(col)
            .ok_or_else(|| ImputeError::index_out_of_bounds(col, self.instructions.len()))?;
        match instruction {
            ImputationInstruction::Mean => Ok(self.mean[col]),
            ImputationInstruction::Median => Ok(self.median[col]),
            ImputationInstruction::Mode => Ok(self.mode[col]),
            ImputationInstruction::Leave => Ok(MISSING_VALUE),
            ImputationInstruction::Error => Err(data_error!(
                row,
                self.column_names[col].clone(),
                "missing value in a column whose instruction is '{}'",
                instruction
            )),
        }
    }
}

/// Number of leading rows selected by `samples` out of `num_rows`.
///
/// 0 selects every row, a value in (0, 1) the rounded fraction, anything
/// larger an absolute count (fractional part dropped) clamped to `num_rows`.
pub fn resolve_sample_rows(samples: f64, num_rows: usize) -> Result<usize> {
    if !samples.is_finite() || samples < 0.0 {
        return Err(ImputeError::invalid_parameter(
            "number_of_train_samples",
            samples.to_string(),
            "must be 0 (all rows), a fraction in (0, 1) or a row count",
        ));
    }

    let rows = if samples == 0.0 {
        num_rows
    } else if samples < 1.0 {
        (samples * num_rows as f64).round() as usize
    } else {
        (samples.floor() as usize).min(num_rows)
    };

    if rows < 1 {
        return Err(ImputeError::invalid_parameter(
            "number_of_train_samples",
            samples.to_string(),
            format!("selects no row of a {}-row training table", num_rows),
        ));
    }
    Ok(rows)
}

/// Instruction of every column after expanding patterns and applying the
/// default.
///
/// Entries are applied in order, a later entry overriding an earlier one.
/// Unknown tokens, unmatched patterns (under [`MissingFieldAction::Error`])
/// and unassigned columns are each reported in one error naming all of them.
pub fn resolve_instructions(
    column_names: &[String],
    config: &MeanMedianModeConfig,
) -> Result<Vec<ImputationInstruction>> {
    let mut assigned: Vec<Option<ImputationInstruction>> = vec![None; column_names.len()];
    let mut bad_tokens = Vec::new();
    let mut not_found = Vec::new();

    for entry in &config.imputation_spec {
        let instruction = match entry.parse_instruction() {
            Ok(instruction) => instruction,
            Err(_) => {
                bad_tokens.push(format!("({}, {})", entry.field, entry.instruction));
                continue;
            }
        };

        let mut matched = false;
        match entry.field.strip_suffix('*') {
            Some(prefix) => {
                for (col, name) in column_names.iter().enumerate() {
                    if name.starts_with(prefix) {
                        assigned[col] = Some(instruction);
                        matched = true;
                    }
                }
            }
            None => {
                if let Some(col) = column_names.iter().position(|name| *name == entry.field) {
                    assigned[col] = Some(instruction);
                    matched = true;
                }
            }
        }
        if !matched {
            not_found.push(entry.field.clone());
        }
    }

    if !bad_tokens.is_empty() {
        return Err(ImputeError::invalid_parameter(
            "imputation_spec",
            bad_tokens.join(", "),
            "expected one of mean, median, mode, none, err",
        ));
    }

    if !not_found.is_empty() {
        match config.missing_field_action {
            MissingFieldAction::Error => {
                return Err(ImputeError::config(format!(
                    "fields not found: {}",
                    not_found.join(", ")
                )))
            }
            MissingFieldAction::Warn => {
                log::warn!("Imputation fields not found: {}", not_found.join(", "));
            }
        }
    }

    if let Some(default) = config.default_instruction()? {
        for slot in assigned.iter_mut().filter(|slot| slot.is_none()) {
            *slot = Some(default);
        }
    }

    let unresolved: Vec<&str> = assigned
        .iter()
        .zip(column_names)
        .filter(|(slot, _)| slot.is_none())
        .map(|(_, name)| name.as_str())
        .collect();
    if !unresolved.is_empty() {
        return Err(ImputeError::config(format!(
            "no imputation instruction for columns: {}",
            unresolved.join(", ")
        )));
    }

    Ok(assigned.into_iter().flatten().collect())
}

fn compute_statistics(columns: Vec<Vec<Real>>) -> Result<Array2<Real>> {
    let sorter = ColumnSorter::new();
    let mut stats = Array2::zeros((STATISTIC_ROWS, columns.len()));
    for (col, mut values) in columns.into_iter().enumerate() {
        let summary = summarize_column(&mut values, &sorter)?;
        stats[[MEAN_ROW, col]] = summary.mean;
        stats[[MEDIAN_ROW, col]] = summary.median;
        stats[[MODE_ROW, col]] = summary.mode;
        stats[[PRESENT_ROW, col]] = summary.present as Real;
    }
    Ok(stats)
}
