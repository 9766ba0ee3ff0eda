//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Container configuration section.
///
/// # Example
///
/// ```
/// use interpose_config::ContainerConfig;
///
/// let config = ContainerConfig {
///     max_chain_length: 16,
///     ..Default::default()
/// };
/// assert!(config.log_lifecycle);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Longest interceptor chain accepted at registration, per method or event.
    #[serde(default = "default_max_chain_length")]
    pub max_chain_length: usize,

    /// Emit `debug` events when beans are created or destroyed.
    #[serde(default = "default_true")]
    pub log_lifecycle: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_chain_length: default_max_chain_length(),
            log_lifecycle: true,
        }
    }
}

impl ContainerConfig {
    /// Checks the section on its own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `max_chain_length` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_length == 0 {
            return Err(ConfigError::invalid_value(
                "container.max_chain_length",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_max_chain_length() -> usize {
    64
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info" or "interpose=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit span open/close events.
    #[serde(default)]
    pub span_events: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Histogram bucket boundaries for invocation duration, in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_buckets: default_duration_buckets(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    interpose_telemetry::MetricsConfig::default().duration_buckets
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_validate() {
        assert!(ContainerConfig::default().validate().is_ok());

        let zero = ContainerConfig {
            max_chain_length: 0,
            ..ContainerConfig::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "container.max_chain_length"
        ));
    }

    #[test]
    fn test_container_defaults() {
        let config = ContainerConfig::default();
        assert_eq!(config.max_chain_length, 64);
        assert!(config.log_lifecycle);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: ContainerConfig = toml::from_str("max_chain_length = 8").unwrap();
        assert_eq!(config.max_chain_length, 8);
        assert!(config.log_lifecycle);
    }

    #[test]
    fn test_log_format_lowercase() {
        let section: LoggingSection = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(section.format, LogFormat::Pretty);
        assert!(toml::from_str::<LoggingSection>(r#"format = "Pretty""#).is_err());
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        let section = MetricsSection::default();
        assert!(!section.enabled);
        assert!(!section.duration_buckets.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<ContainerConfig>("max_depth = 3").is_err());
    }
}
