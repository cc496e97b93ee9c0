//! Configuration management for launchscope
//!
//! Configuration comes from a TOML file, from `LAUNCHSCOPE_*` environment
//! variables layered over the defaults, or from the defaults alone.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analytics::{CategoryAttribution, InterpolationMode, ScoringConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trendline reconstruction settings
    pub reconstruction: ReconstructionConfig,

    /// Category aggregation settings
    pub aggregation: AggregationConfig,

    /// Market-intelligence weights and thresholds
    pub scoring: ScoringConfig,

    /// Data source locations
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Gap-fill strategy (step_hold, linear)
    pub strategy: InterpolationMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Which category labels an entity contributes to (primary_only, all_labels)
    pub attribution: CategoryAttribution,
}

/// Data source configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub sqlite_path: Option<PathBuf>,

    /// Directory holding entities.json, snapshots.json and records.json
    pub json_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("LAUNCHSCOPE_STRATEGY") {
            config.reconstruction.strategy = InterpolationMode::parse(&value)
                .with_context(|| format!("Unknown LAUNCHSCOPE_STRATEGY: {value}"))?;
        }

        if let Ok(value) = std::env::var("LAUNCHSCOPE_ATTRIBUTION") {
            config.aggregation.attribution = CategoryAttribution::parse(&value)
                .with_context(|| format!("Unknown LAUNCHSCOPE_ATTRIBUTION: {value}"))?;
        }

        config.storage.sqlite_path = std::env::var("LAUNCHSCOPE_SQLITE_PATH").ok().map(PathBuf::from);
        config.storage.json_dir = std::env::var("LAUNCHSCOPE_JSON_DIR").ok().map(PathBuf::from);

        if let Ok(level) = std::env::var("LAUNCHSCOPE_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }

        if let Ok(format) = std::env::var("LAUNCHSCOPE_LOG_FORMAT") {
            config.logging.format = format.to_lowercase();
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if let Err(reason) = self.scoring.validate() {
            anyhow::bail!("Invalid scoring config: {reason}");
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {LOG_LEVELS:?}, got {:?}",
                self.logging.level
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "logging.format must be one of {LOG_FORMATS:?}, got {:?}",
                self.logging.format
            );
        }

        if self.storage.sqlite_path.is_some() && self.storage.json_dir.is_some() {
            anyhow::bail!("storage.sqlite_path and storage.json_dir are mutually exclusive");
        }

        Ok(())
    }
}
