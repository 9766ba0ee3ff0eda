//! Invocation metrics.
//!
//! Recording goes through the `metrics` facade, so it is a no-op until a
//! recorder is installed. [`init_metrics`] installs an in-process Prometheus
//! recorder whose output is available from [`render_metrics`].
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `interpose_invocations_total` | Counter | `method`, `outcome` | Intercepted calls |
//! | `interpose_invocation_duration_seconds` | Histogram | `method` | Chain latency |
//! | `interpose_lifecycle_events_total` | Counter | `bean`, `kind` | Lifecycle chains run |
//!
//! # Example
//!
//! ```rust,ignore
//! use interpose_telemetry::metrics::record_invocation;
//!
//! record_invocation("OrderService::place", "ok", Duration::from_millis(3));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Counter of intercepted business-method calls.
pub const INVOCATIONS_TOTAL: &str = "interpose_invocations_total";

/// Histogram of intercepted call duration, in seconds.
pub const INVOCATION_DURATION_SECONDS: &str = "interpose_invocation_duration_seconds";

/// Counter of lifecycle chains run by the container.
pub const LIFECYCLE_EVENTS_TOTAL: &str = "interpose_lifecycle_events_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,

    /// Histogram buckets for invocation duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // 100µs up to 5s
            duration_buckets: vec![
                0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
            ],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// Does nothing when `config.enabled` is false. Calling it again after a
/// successful install fails, because the global recorder can only be set once.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are invalid or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(INVOCATION_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if [`init_metrics`] has not installed a recorder.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(
        INVOCATIONS_TOTAL,
        "Total number of intercepted business-method calls"
    );
    describe_histogram!(
        INVOCATION_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Duration of intercepted business-method calls"
    );
    describe_counter!(
        LIFECYCLE_EVENTS_TOTAL,
        "Total number of lifecycle interception chains run"
    );
}

/// Records a completed intercepted call.
///
/// * `method` - Qualified method name (e.g., "OrderService::place")
/// * `outcome` - "ok" or "error"
/// * `duration` - Time spent in the remainder of the chain
pub fn record_invocation(method: &str, outcome: &str, duration: Duration) {
    counter!(
        INVOCATIONS_TOTAL,
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        INVOCATION_DURATION_SECONDS,
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a lifecycle chain run for `bean`.
pub fn record_lifecycle(bean: &str, kind: &str) {
    counter!(
        LIFECYCLE_EVENTS_TOTAL,
        "bean" => bean.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert!(config.duration_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_disabled_init_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the facade drops everything.
        record_invocation("Svc::work", "ok", Duration::from_millis(2));
        record_invocation("Svc::work", "error", Duration::from_micros(40));
        record_lifecycle("orders", "post_construct");
        describe_metrics();
    }
}
