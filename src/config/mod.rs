//! Configuration management for tabimpute.
//!
//! Strategy and cache settings with serde (de)serialization, environment
//! overrides and validation.

pub mod core;

pub use self::core::{
    CacheConfig, FieldInstruction, ImputeConfig, MeanMedianModeConfig,
    MeanMedianModeConfigBuilder, NeighborhoodConfig,
};

/// Configuration file looked up by the command line tool when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "tabimpute.toml";
