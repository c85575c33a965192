//! # Aegis Telemetry
//!
//! Logging and metrics setup shared by the `aegis` binary and services that
//! embed the validator runtime.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, JSON or pretty
//!   output on stderr
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use aegis_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::default(), &MetricsConfig::default())?;
//!
//! // ... validate requests ...
//!
//! if let Some(text) = aegis_telemetry::render_metrics() {
//!     println!("{text}");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/aegis-telemetry/0.1.0")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)
}
