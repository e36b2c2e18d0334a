//! Logging and metrics for ctxapi.
//!
//! Both sinks are write-only from the service's point of view:
//!
//! - **Logging**: `tracing` events rendered by `tracing-subscriber`
//! - **Metrics**: `metrics` facade backed by a Prometheus recorder, rendered
//!   on the service's `/metrics` route
//!
//! # Example
//!
//! ```rust,ignore
//! use ctxapi_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let registry = init_telemetry(&TelemetryConfig::default())?;
//! println!("{}", registry.render());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, InFlightGuard, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for all telemetry sinks.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// Returns the registry that renders the `/metrics` body.
///
/// # Errors
///
/// Returns `TelemetryError` if either sink fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<MetricsRegistry> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert!(config.logging.enabled);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_init_with_everything_disabled() {
        let config = TelemetryConfig {
            logging: LogConfig {
                enabled: false,
                ..Default::default()
            },
            metrics: MetricsConfig {
                enabled: false,
                ..Default::default()
            },
        };
        let registry = init_telemetry(&config).unwrap();
        assert!(!registry.render().contains("http_requests_total"));
    }
}
