//! Gate configuration.
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a valid
//! configuration: metrics off, 2 s probe timeout, collaborator failures
//! propagated to the caller.
//!
//! ```toml
//! failure_policy = "reject"
//!
//! [metrics]
//! enabled = true
//! prefix = "csye6225.webapp"
//! host = "127.0.0.1"
//! port = 8125
//!
//! [health]
//! timeout_ms = 1500
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::gate::FailurePolicy;
use crate::metrics::{MetricsSink, NoopMetrics, StatsdMetrics};

/// Maximum accepted config file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The metrics sink could not be created.
    #[error("failed to create metrics sink: {0}")]
    Metrics(String),
}

/// Top-level gate configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// How collaborator failures are handled.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Metrics sink selection.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Health probe settings.
    #[serde(default)]
    pub health: HealthConfig,
}

impl GateConfig {
    /// Reads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is too large,
    /// fails to parse, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let size = fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "config file is {size} bytes, limit is {MAX_CONFIG_FILE_SIZE}"
            )));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on parse or validation failure.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "health.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.metrics.enabled {
            if self.metrics.prefix.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "metrics.prefix is required when metrics are enabled".to_string(),
                ));
            }
            if self.metrics.host.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "metrics.host is required when metrics are enabled".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// `[metrics]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Emit StatsD metrics; when false a no-op sink is used.
    pub enabled: bool,
    /// Prefix prepended to every metric name.
    pub prefix: String,
    /// StatsD host.
    pub host: String,
    /// StatsD UDP port.
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: "csye6225.webapp".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8125,
        }
    }
}

impl MetricsConfig {
    /// Creates the sink this section describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Metrics`] if the StatsD socket cannot be set up.
    pub fn build_sink(&self) -> Result<Arc<dyn MetricsSink>, ConfigError> {
        if !self.enabled {
            return Ok(Arc::new(NoopMetrics));
        }
        let sink = StatsdMetrics::connect(self.prefix.clone(), &self.host, self.port)
            .map_err(|err| ConfigError::Metrics(err.to_string()))?;
        tracing::info!(
            host = %self.host,
            port = self.port,
            prefix = %self.prefix,
            "statsd metrics enabled"
        );
        Ok(Arc::new(sink))
    }
}

/// `[health]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    /// Upper bound on a single datastore probe, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { timeout_ms: 2_000 }
    }
}

impl HealthConfig {
    /// The probe timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
