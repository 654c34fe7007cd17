// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Controller configuration
//!
//! Layered as: built-in defaults, then an optional TOML file, then `OSM_*`
//! environment variables, then command line flags (applied by the binary).

use osm_metrics::{MetricsConfig, MetricsError};
use osm_observability::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while assembling the controller configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("IO error reading configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// An explicitly named configuration file does not exist
    #[error("Configuration file not found at path: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An `OSM_*` override could not be parsed
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsingError {
        /// Variable name
        variable_name: String,
        /// Raw value
        value: String,
        /// What was expected instead
        reason: String,
    },

    /// The assembled settings are not servable
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] MetricsError),
}

impl ConfigError {
    /// Build a [`ConfigError::EnvVarParsingError`]
    pub fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsingError {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level controller configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Scrape endpoint
    pub metrics: MetricsConfig,

    /// Log output
    pub logging: LoggingSettings,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive; unset defers to `OSM_LOG` / `RUST_LOG`
    pub level: Option<String>,
    /// Output format
    pub format: LogFormat,
    /// ANSI colors for the pretty and compact formats
    pub color: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::Pretty,
            color: true,
        }
    }
}

impl LoggingSettings {
    /// Logging setup for [`osm_observability::init_tracing_with_config`]
    pub fn to_log_config(&self) -> LogConfig {
        let config = LogConfig::new()
            .with_format(self.format)
            .with_color(self.color);
        match &self.level {
            Some(level) => config.with_level(level.clone()),
            None => config,
        }
    }
}

impl ControllerConfig {
    /// Load from `path`, or use defaults when no path is given
    ///
    /// An explicitly named file that does not exist is an error.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a TOML document; missing tables and keys take their defaults
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `OSM_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `OSM_*` overrides read through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Metrics settings
        if let Some(value) = lookup("OSM_METRICS_ENABLED") {
            self.metrics.enabled = parse_bool("OSM_METRICS_ENABLED", &value)?;
        }
        if let Some(value) = lookup("OSM_METRICS_BIND_ADDRESS") {
            self.metrics.bind_address = value;
        }
        if let Some(value) = lookup("OSM_METRICS_PORT") {
            self.metrics.port = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "OSM_METRICS_PORT",
                    &value,
                    "expected valid port number (0-65535)",
                )
            })?;
        }
        if let Some(value) = lookup("OSM_METRICS_PATH") {
            self.metrics.path = value;
        }

        // Logging settings
        if let Some(value) = lookup("OSM_LOG_LEVEL") {
            self.logging.level = Some(value);
        }
        if let Some(value) = lookup("OSM_LOG_FORMAT") {
            self.logging.format = value.parse().map_err(|e: osm_observability::LogError| {
                ConfigError::env_var_parsing_error("OSM_LOG_FORMAT", &value, e.to_string())
            })?;
        }

        Ok(())
    }

    /// Check the assembled configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.metrics.validate()?;
        Ok(())
    }
}

fn parse_bool(variable_name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            variable_name,
            value,
            "expected boolean (true/false, 1/0, yes/no, on/off)",
        )),
    }
}
