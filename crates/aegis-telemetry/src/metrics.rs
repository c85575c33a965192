//! Prometheus metrics for Aegis.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `aegis_validations_total` | Counter | `endpoint`, `outcome` | Requests checked by the validator runtime |
//! | `aegis_generated_endpoints_total` | Counter | `outcome` | Endpoints processed by `generate` |
//! | `aegis_generation_duration_seconds` | Histogram | - | Extract and compile time per endpoint |
//! | `aegis_stale_contracts_total` | Counter | `status` | Drift found by `check` |
//!
//! Validation counts are recorded by `aegis-sentinel` itself; this module
//! describes them and installs the recorder.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use aegis_sentinel::VALIDATIONS_TOTAL;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Endpoints processed by `generate`, by outcome.
pub const GENERATED_ENDPOINTS_TOTAL: &str = "aegis_generated_endpoints_total";

/// Time spent extracting and compiling one endpoint.
pub const GENERATION_DURATION_SECONDS: &str = "aegis_generation_duration_seconds";

/// Drift reported by `check`, by status.
pub const STALE_CONTRACTS_TOTAL: &str = "aegis_stale_contracts_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for generation duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s
            duration_buckets: vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
        }
    }
}

/// Initializes the metrics subsystem.
///
/// Installs a Prometheus recorder without an HTTP listener. Services that
/// embed the validator runtime expose [`render_metrics`] on their own route.
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
            Matcher::Full(GENERATION_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        VALIDATIONS_TOTAL,
        "Requests checked against compiled contracts, by endpoint and outcome"
    );

    describe_counter!(
        GENERATED_ENDPOINTS_TOTAL,
        "Endpoints processed by artifact generation, by outcome"
    );

    describe_histogram!(
        GENERATION_DURATION_SECONDS,
        "Time to extract and compile one endpoint in seconds"
    );

    describe_counter!(
        STALE_CONTRACTS_TOTAL,
        "Endpoints whose artifacts drifted from their sources, by status"
    );
}

/// Records one endpoint processed by `generate`.
///
/// # Arguments
///
/// * `outcome` - "written", "unchanged" or "failed"
/// * `duration` - Extract and compile time
pub fn record_generation(outcome: &'static str, duration: Duration) {
    counter!(GENERATED_ENDPOINTS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(GENERATION_DURATION_SECONDS).record(duration.as_secs_f64());
}

/// Records one endpoint found out of date by `check`.
pub fn record_stale_contract(status: &'static str) {
    counter!(STALE_CONTRACTS_TOTAL, "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(config.duration_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the metrics facade drops these.
        record_generation("written", Duration::from_millis(3));
        record_stale_contract("missing");
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(VALIDATIONS_TOTAL, "aegis_validations_total");
        assert!(GENERATED_ENDPOINTS_TOTAL.starts_with("aegis_"));
        assert!(GENERATION_DURATION_SECONDS.ends_with("_seconds"));
    }
}
