//! Analyzer configuration
//!
//! Everything the pipeline needs is injected through [`AnalyzerConfig`] at
//! construction; there are no process-wide registries. Defaults cover a
//! four-sensor MQ-series array reporting Rs/R0 ratios over a plain TCP
//! line stream.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dashboard::{DEFAULT_REFRESH_MS, DEFAULT_WINDOW_SIZE};
use crate::protocol::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};

/// Errors that can occur while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        /// Path that could not be read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        /// Path that could not be parsed
        path: String,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One configured sensor channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Channel name as it appears on the wire (e.g. `MQ-3`)
    pub name: String,
    /// Unit label shown next to readings
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Readings strictly below this value are flagged as alerts
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl SensorSpec {
    /// Create a spec with the default unit and threshold
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: default_unit(),
            threshold: default_threshold(),
        }
    }
}

fn default_unit() -> String {
    "Rs/R0".to_string()
}

fn default_threshold() -> f64 {
    0.5
}

/// Top-level analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Analyzer device host
    pub host: String,
    /// Analyzer device TCP port
    pub port: u16,
    /// TCP connect and read timeout in seconds
    pub timeout_secs: f64,
    /// Lower bound of the reconnect jitter delay in seconds
    pub retry_min_secs: f64,
    /// Upper bound of the reconnect jitter delay in seconds
    pub retry_max_secs: f64,
    /// Number of readings retained per sensor for trend display
    pub window_size: usize,
    /// Presentation refresh period in milliseconds
    pub refresh_ms: u64,
    /// Configured sensor channels
    pub sensors: Vec<SensorSpec>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.4.1".to_string(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_min_secs: 2.0,
            retry_max_secs: 5.0,
            window_size: DEFAULT_WINDOW_SIZE,
            refresh_ms: DEFAULT_REFRESH_MS,
            sensors: vec![
                SensorSpec::named("MQ-3"),
                SensorSpec::named("MQ-135"),
                SensorSpec::named("MQ-136"),
                SensorSpec::named("MQ-137"),
            ],
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to the defaults, so a partial file is fine.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if self.retry_min_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "retry_min_secs must not be negative".to_string(),
            ));
        }
        if self.retry_max_secs < self.retry_min_secs {
            return Err(ConfigError::Invalid(format!(
                "retry_max_secs ({}) is below retry_min_secs ({})",
                self.retry_max_secs, self.retry_min_secs
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate sensor name '{}'",
                    sensor.name
                )));
            }
        }
        Ok(())
    }

    /// Target endpoint as `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect/read timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    /// Reconnect jitter bounds in seconds
    pub fn retry_jitter(&self) -> (f64, f64) {
        (self.retry_min_secs, self.retry_max_secs)
    }

    /// Presentation refresh period as a [`Duration`]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// Look up a sensor spec by channel name
    pub fn sensor(&self, name: &str) -> Option<&SensorSpec> {
        self.sensors.iter().find(|s| s.name == name)
    }
}
