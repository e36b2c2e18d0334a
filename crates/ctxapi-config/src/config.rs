//! Root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{CacheSection, ConfigError, ServerSection, TelemetrySection};

/// Complete service configuration.
///
/// # Example
///
/// ```
/// use ctxapi_config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:3000");
/// assert_eq!(config.cache.port, 6379);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// External cache settings.
    #[serde(default)]
    pub cache: CacheSection,

    /// Logging and metrics settings.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl AppConfig {
    /// Checks values that deserialization cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparseable listen
    /// address, a zero body limit, an empty cache host, a negative database
    /// index or an invalid log filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }
        if self.cache.host.trim().is_empty() {
            return Err(ConfigError::invalid_value("cache.host", "must not be empty"));
        }
        if self.cache.database < 0 {
            return Err(ConfigError::invalid_value(
                "cache.database",
                "must not be negative",
            ));
        }
        ctxapi_telemetry::logging::create_env_filter(&self.telemetry.log_level)
            .map_err(|e| ConfigError::invalid_value("telemetry.log_level", e.to_string()))?;

        Ok(())
    }

    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `server.http_addr` is not a
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .http_addr
            .parse()
            .map_err(|e| ConfigError::invalid_value("server.http_addr", format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = AppConfig::default();
        config.server.http_addr = "not-an-address".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_zero_body_limit() {
        let mut config = AppConfig::default();
        config.server.max_body_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.max_body_bytes"));
    }

    #[test]
    fn test_empty_cache_host() {
        let mut config = AppConfig::default();
        config.cache.host = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_database() {
        let mut config = AppConfig::default();
        config.cache.database = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.telemetry.log_level = "ctxapi=notalevel".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            http_addr = "127.0.0.1:4000"

            [cache]
            host = "redis"
            database = 2

            [telemetry]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:4000");
        assert_eq!(config.server.shutdown_timeout_secs, 30);
        assert_eq!(config.cache.host, "redis");
        assert_eq!(config.cache.port, 6379);
        assert_eq!(config.cache.database, 2);
        assert_eq!(config.telemetry.log_format, crate::LogFormatSetting::Json);
    }
}
