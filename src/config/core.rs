//! Core configuration structures for tabimpute.
//!
//! [`ImputeConfig`] groups the settings of every strategy plus the cache
//! settings. It round-trips through JSON and TOML, can be overridden from
//! `TABIMPUTE_*` environment variables, and is validated before use.
//! Instruction tokens are kept as text here and only resolved against a
//! table when a strategy is built, so that an unknown token can be reported
//! together with the pattern it was paired with.

use crate::core::constants::{COVARIANCE_ARTIFACT, ENV_PREFIX, MEAN_MEDIAN_MODE_ARTIFACT};
use crate::core::error::{ImputeError, Result};
use crate::core::types::{ImputationInstruction, MissingFieldAction};
use crate::ensure;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `(field pattern, instruction token)` entry.
///
/// A pattern ending in `*` matches every column whose name starts with the
/// text before the `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInstruction {
    /// Column name or `prefix*` pattern
    pub field: String,
    /// One of `mean`, `median`, `mode`, `none`, `err`
    pub instruction: String,
}

impl FieldInstruction {
    /// Pair `field` with `instruction`.
    pub fn new<F: Into<String>, I: Into<String>>(field: F, instruction: I) -> Self {
        FieldInstruction {
            field: field.into(),
            instruction: instruction.into(),
        }
    }

    /// Parsed instruction token.
    pub fn parse_instruction(&self) -> Result<ImputationInstruction> {
        self.instruction.parse().map_err(|_| {
            ImputeError::invalid_parameter(
                "imputation_spec",
                format!("({}, {})", self.field, self.instruction),
                "expected one of mean, median, mode, none, err",
            )
        })
    }
}

/// Settings of the mean/median/mode strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanMedianModeConfig {
    /// Leading training rows used: 0 for all, a fraction in (0, 1), or a count
    pub number_of_train_samples: f64,
    /// Per-column instructions, applied in order
    pub imputation_spec: Vec<FieldInstruction>,
    /// Instruction for columns no pattern assigns
    pub default_instruction: Option<String>,
    /// Reaction to a pattern that matches no column
    pub missing_field_action: MissingFieldAction,
}

impl Default for MeanMedianModeConfig {
    fn default() -> Self {
        MeanMedianModeConfig {
            number_of_train_samples: 0.0,
            imputation_spec: Vec::new(),
            default_instruction: None,
            missing_field_action: MissingFieldAction::Error,
        }
    }
}

impl MeanMedianModeConfig {
    /// Validate every field, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if let Err(e) = validate_sample_count(self.number_of_train_samples) {
            problems.push(e.to_string());
        }
        for entry in &self.imputation_spec {
            if entry.field.is_empty() {
                problems.push(format!("empty field pattern for instruction '{}'", entry.instruction));
            }
            if let Err(e) = entry.parse_instruction() {
                problems.push(e.to_string());
            }
        }
        if let Some(token) = &self.default_instruction {
            if let Err(e) = token.parse::<ImputationInstruction>() {
                problems.push(format!("default_instruction: {}", e));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ImputeError::config(format!(
                "mean/median/mode configuration is invalid: {}",
                problems.join("; ")
            )))
        }
    }

    /// Parsed default instruction.
    pub fn default_instruction(&self) -> Result<Option<ImputationInstruction>> {
        self.default_instruction
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}

/// Settings of the neighbourhood strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
    /// Leading neighbours of each index row that are consulted
    pub neighbor_count: usize,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        NeighborhoodConfig { neighbor_count: 5 }
    }
}

/// Where and whether statistics are memoized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist statistics in the training table's metadata directory
    pub enabled: bool,
    /// Artifact stem of the mean/median/mode statistics
    pub mean_median_mode_stem: String,
    /// Artifact stem of the covariance estimate
    pub covariance_stem: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            mean_median_mode_stem: MEAN_MEDIAN_MODE_ARTIFACT.to_string(),
            covariance_stem: COVARIANCE_ARTIFACT.to_string(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputeConfig {
    /// Cache settings
    pub cache: CacheConfig,
    /// Neighbourhood strategy settings
    pub neighborhood: NeighborhoodConfig,
    /// Mean/median/mode strategy settings
    pub mean_median_mode: MeanMedianModeConfig,
}

impl ImputeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.mean_median_mode.validate()?;

        ensure!(
            self.neighborhood.neighbor_count > 0,
            ImputeError::invalid_parameter("neighbor_count", "0", "must be at least 1")
        );

        for (name, stem) in [
            ("mean_median_mode_stem", &self.cache.mean_median_mode_stem),
            ("covariance_stem", &self.cache.covariance_stem),
        ] {
            ensure!(
                !stem.is_empty() && !stem.contains(['/', '\\']),
                ImputeError::invalid_parameter(name, stem.as_str(), "must be a non-empty file stem")
            );
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: ImputeConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ImputeError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(ImputeError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ImputeError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(ImputeError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration with environment overrides applied
    pub fn load_from_environment() -> Result<Self> {
        let mut config = ImputeConfig::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Override fields from `TABIMPUTE_*` environment variables
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_value("NUMBER_OF_TRAIN_SAMPLES") {
            self.mean_median_mode.number_of_train_samples = val
                .parse()
                .map_err(|_| env_error("NUMBER_OF_TRAIN_SAMPLES", &val))?;
        }

        if let Some(val) = env_value("DEFAULT_INSTRUCTION") {
            self.mean_median_mode.default_instruction = Some(val);
        }

        if let Some(val) = env_value("MISSING_FIELD_ACTION") {
            self.mean_median_mode.missing_field_action = val
                .parse()
                .map_err(|_| env_error("MISSING_FIELD_ACTION", &val))?;
        }

        if let Some(val) = env_value("NEIGHBOR_COUNT") {
            self.neighborhood.neighbor_count = val
                .parse()
                .map_err(|_| env_error("NEIGHBOR_COUNT", &val))?;
        }

        if let Some(val) = env_value("CACHE_ENABLED") {
            self.cache.enabled = match val.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(env_error("CACHE_ENABLED", &val)),
            };
        }

        self.validate()
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn env_error(name: &str, value: &str) -> ImputeError {
    ImputeError::config(format!("Invalid {}{}: '{}'", ENV_PREFIX, name, value))
}

fn validate_sample_count(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        ImputeError::invalid_parameter(
            "number_of_train_samples",
            value.to_string(),
            "must be 0 (all rows), a fraction in (0, 1) or a row count",
        )
    );
    Ok(())
}

/// Builder for [`MeanMedianModeConfig`].
///
/// Problems are collected as setters run and reported together by
/// [`build`](MeanMedianModeConfigBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct MeanMedianModeConfigBuilder {
    config: MeanMedianModeConfig,
    validation_errors: Vec<String>,
}

impl MeanMedianModeConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many leading training rows are used
    pub fn number_of_train_samples(mut self, samples: f64) -> Self {
        if let Err(e) = validate_sample_count(samples) {
            self.validation_errors.push(e.to_string());
        }
        self.config.number_of_train_samples = samples;
        self
    }

    /// Append a `(pattern, token)` entry
    pub fn instruction<F: Into<String>, I: Into<String>>(mut self, field: F, instruction: I) -> Self {
        let entry = FieldInstruction::new(field, instruction);
        if let Err(e) = entry.parse_instruction() {
            self.validation_errors.push(e.to_string());
        }
        self.config.imputation_spec.push(entry);
        self
    }

    /// Set the instruction for columns no pattern assigns
    pub fn default_instruction<I: Into<String>>(mut self, instruction: I) -> Self {
        let token = instruction.into();
        if token.parse::<ImputationInstruction>().is_err() {
            self.validation_errors
                .push(format!("default_instruction '{}' is not a known instruction", token));
        }
        self.config.default_instruction = Some(token);
        self
    }

    /// Set the reaction to patterns matching no column
    pub fn missing_field_action(mut self, action: MissingFieldAction) -> Self {
        self.config.missing_field_action = action;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MeanMedianModeConfig> {
        if !self.validation_errors.is_empty() {
            return Err(ImputeError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}
