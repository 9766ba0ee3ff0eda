//! Main configuration types.
//!
//! This module provides the top-level [`InterposeConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ContainerConfig, LogFormat, TelemetrySection};
use interpose_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};

/// Complete Interpose runtime configuration.
///
/// # Example
///
/// ```
/// use interpose_config::InterposeConfig;
///
/// let config = InterposeConfig::default();
/// assert_eq!(config.container.max_chain_length, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct InterposeConfig {
    /// Container configuration.
    #[serde(default)]
    pub container: ContainerConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl InterposeConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> InterposeConfigBuilder {
        InterposeConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `container.max_chain_length` is zero
    /// - `telemetry.logging.level` is empty
    /// - `telemetry.metrics.duration_buckets` is empty or not strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.container.validate()?;

        if self.telemetry.logging.enabled && self.telemetry.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                "must not be empty when logging is enabled",
            ));
        }

        let buckets = &self.telemetry.metrics.duration_buckets;
        if buckets.is_empty() || !buckets.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.duration_buckets",
                "must be a non-empty, strictly increasing list",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with span events.
    ///
    /// # Example
    ///
    /// ```
    /// use interpose_config::InterposeConfig;
    ///
    /// let config = InterposeConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.span_events = true;
        config
    }

    /// Production preset: JSON info logs, metrics on, no lifecycle events.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.container.log_lifecycle = false;
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config
    }

    /// Converts the telemetry section into the initializer's configuration.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        let logging = &self.telemetry.logging;
        let json_format = logging.format == LogFormat::Json;
        TelemetryConfig {
            logging: LogConfig {
                enabled: logging.enabled,
                level: logging.level.clone(),
                json_format,
                span_events: logging.span_events,
                file_line_info: !json_format,
                include_target: true,
            },
            metrics: MetricsConfig {
                enabled: self.telemetry.metrics.enabled,
                duration_buckets: self.telemetry.metrics.duration_buckets.clone(),
            },
        }
    }
}

/// Builder for [`InterposeConfig`].
#[derive(Debug, Default)]
pub struct InterposeConfigBuilder {
    container: Option<ContainerConfig>,
    telemetry: Option<TelemetrySection>,
}

impl InterposeConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container configuration.
    #[must_use]
    pub fn container(mut self, container: ContainerConfig) -> Self {
        self.container = Some(container);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> InterposeConfig {
        InterposeConfig {
            container: self.container.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<InterposeConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
