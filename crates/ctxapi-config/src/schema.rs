//! Configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ctxapi_cache::CacheConfig;
use ctxapi_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit (100 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

/// HTTP server section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body in bytes; larger bodies get 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerSection {
    /// Replaces the port of `http_addr`, keeping its host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .http_addr
            .rsplit_once(':')
            .map_or("0.0.0.0", |(host, _)| host);
        self.http_addr = format!("{host}:{port}");
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// External cache section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    /// Cache host.
    #[serde(default = "default_cache_host")]
    pub host: String,

    /// Cache port.
    #[serde(default = "default_cache_port")]
    pub port: u16,

    /// Logical database index.
    #[serde(default)]
    pub database: i64,
}

impl CacheSection {
    /// Converts to the adapter's configuration.
    #[must_use]
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.host.clone(), self.port).with_database(self.database)
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            host: default_cache_host(),
            port: default_cache_port(),
            database: 0,
        }
    }
}

fn default_cache_host() -> String {
    ctxapi_cache::DEFAULT_HOST.to_string()
}

fn default_cache_port() -> u16 {
    ctxapi_cache::DEFAULT_PORT
}

/// Log output format as written in configuration files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// JSON lines.
    Json,

    /// Human-readable.
    #[default]
    Pretty,
}

impl From<LogFormatSetting> for LogFormat {
    fn from(setting: LogFormatSetting) -> Self {
        match setting {
            LogFormatSetting::Json => Self::Json,
            LogFormatSetting::Pretty => Self::Pretty,
        }
    }
}

/// Telemetry section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Log filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormatSetting,

    /// Whether to install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Also append logs to this file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl TelemetrySection {
    /// Converts to the telemetry crate's configuration.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: LogConfig {
                level: self.log_level.clone(),
                format: self.log_format.into(),
                file: self.log_file.clone(),
                ..LogConfig::default()
            },
            metrics: MetricsConfig {
                enabled: self.metrics_enabled,
                ..MetricsConfig::default()
            },
        }
    }
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormatSetting::default(),
            metrics_enabled: true,
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerSection::default();
        assert_eq!(server.http_addr, "0.0.0.0:3000");
        assert_eq!(server.shutdown_timeout_secs, 30);
        assert_eq!(server.max_body_bytes, 102_400);
    }

    #[test]
    fn test_set_port_keeps_host() {
        let mut server = ServerSection {
            http_addr: "127.0.0.1:3000".to_string(),
            ..Default::default()
        };
        server.set_port(8081);
        assert_eq!(server.http_addr, "127.0.0.1:8081");

        let mut server = ServerSection {
            http_addr: "[::1]:3000".to_string(),
            ..Default::default()
        };
        server.set_port(9000);
        assert_eq!(server.http_addr, "[::1]:9000");
    }

    #[test]
    fn test_cache_section_conversion() {
        let section = CacheSection {
            host: "redis".to_string(),
            port: 6380,
            database: 1,
        };
        assert_eq!(section.to_cache_config().url(), "redis://redis:6380/1");
    }

    #[test]
    fn test_telemetry_section_conversion() {
        let section = TelemetrySection {
            log_level: "debug".to_string(),
            log_format: LogFormatSetting::Json,
            metrics_enabled: false,
            log_file: Some(PathBuf::from("/var/log/app.log")),
        };
        let config = section.to_telemetry_config();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.logging.file.as_deref(),
            Some(std::path::Path::new("/var/log/app.log"))
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let section: CacheSection = serde_json::from_str(r#"{"host":"cache"}"#).unwrap();
        assert_eq!(section.port, 6379);
        assert_eq!(section.database, 0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<CacheSection, _> = serde_json::from_str(r#"{"hostname":"x"}"#);
        assert!(result.is_err());
    }
}
