//! Prometheus metrics.
//!
//! The recorder is installed without its own HTTP listener: the service
//! exposes the rendered text on its `/metrics` route.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `http_requests_total` | Counter | `method`, `route`, `status_code` | Total requests |
//! | `http_request_duration_seconds` | Histogram | `route` | Request latency |
//! | `http_requests_in_flight` | Gauge | - | In-flight requests |
//! | `cache_errors_total` | Counter | `kind` | Cache failures by class |
//!
//! Process series (`process_cpu_seconds_total`, `process_resident_memory_bytes`,
//! `process_open_fds`, `process_start_time_seconds`, ...) come from
//! `metrics-process` and are sampled on every render.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use std::sync::Arc;
use std::time::Duration;

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the global recorder.
    pub enabled: bool,

    /// Histogram buckets for request duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 5ms .. 10s; the delay endpoint lives at the top end
            duration_buckets: vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        }
    }
}

/// Handle used to render collected metrics.
#[derive(Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
    process: Option<Arc<Collector>>,
}

impl MetricsRegistry {
    /// Wraps an existing handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self {
            handle,
            process: None,
        }
    }

    /// Samples process metrics (CPU, memory, file descriptors, start time)
    /// before each render.
    ///
    /// Descriptions go to the recorder current at the time of the call.
    #[must_use]
    pub fn with_process_metrics(mut self) -> Self {
        let collector = Collector::default();
        collector.describe();
        self.process = Some(Arc::new(collector));
        self
    }

    /// Creates a registry whose recorder is not installed globally.
    ///
    /// Nothing recorded through the `metrics` macros reaches it; rendering
    /// yields an empty exposition. Used when metrics are disabled.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(PrometheusBuilder::new().build_recorder().handle())
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        if let Some(process) = &self.process {
            process.collect();
        }
        self.handle.render()
    }

    /// Returns the content type of [`render`](Self::render)'s output.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("process_metrics", &self.process.is_some())
            .finish_non_exhaustive()
    }
}

/// Installs the global Prometheus recorder.
///
/// Returns a detached registry when metrics are disabled.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a recorder is already installed
/// or the buckets are invalid.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<MetricsRegistry> {
    if !config.enabled {
        return Ok(MetricsRegistry::detached());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&config.duration_buckets)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();

    Ok(MetricsRegistry::new(handle).with_process_metrics())
}

fn register_metric_descriptions() {
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!("cache_errors_total", "Cache failures by kind");
}

/// Records a completed request.
pub fn record_request(method: &str, route: &str, status_code: u16, duration: Duration) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a cache failure (`unavailable` or `operation`).
pub fn record_cache_error(kind: &'static str) {
    counter!("cache_errors_total", "kind" => kind).increment(1);
}

/// Guard that tracks one in-flight request.
///
/// Increments the gauge on creation and decrements it on drop, including
/// when the request future is dropped early.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("http_requests_in_flight").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("http_requests_in_flight").decrement(1.0);
    }
}
