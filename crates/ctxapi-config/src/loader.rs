//! Configuration loader with layered approach.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{AppConfig, ConfigError, LogFormatSetting};

/// Prefix for structured overrides (`CTXAPI__SECTION__KEY`).
pub const ENV_PREFIX: &str = "CTXAPI";

/// Configuration loader.
///
/// Layers, later overriding earlier:
/// 1. Defaults
/// 2. Configuration file (TOML or JSON)
/// 3. Plain service variables: `PORT`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`
/// 4. Prefixed variables: `CTXAPI__SERVER__HTTP_ADDR` and friends
///
/// # Example
///
/// ```no_run
/// use ctxapi_config::ConfigLoader;
///
/// # fn main() -> Result<(), ctxapi_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("ctxapi.toml")?
///     .with_dotenv()
///     .load()?;
///
/// println!("listening on {}", config.server.http_addr);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AppConfig,
    vars: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            vars: None,
        }
    }

    /// Loads a configuration file, replacing the current values.
    ///
    /// The format is chosen by extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable or invalid.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads a `.env` file into the process environment, if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the final
    /// configuration is invalid.
    pub fn load(mut self) -> Result<AppConfig, ConfigError> {
        let mut vars = self.vars.take().unwrap_or_else(|| env::vars().collect());
        // Prefixed overrides must win over plain variables.
        vars.sort_by_key(|(key, _)| key.starts_with(ENV_PREFIX));

        for (key, value) in &vars {
            self.apply_env_var(key, value)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "PORT" => {
                let port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?;
                self.config.server.set_port(port);
                return Ok(());
            }
            "REDIS_HOST" => {
                self.config.cache.host = value.to_string();
                return Ok(());
            }
            "REDIS_PORT" => {
                self.config.cache.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?;
                return Ok(());
            }
            "REDIS_DB" => {
                self.config.cache.database = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
                return Ok(());
            }
            _ => {}
        }

        let Some(rest) = key
            .strip_prefix(ENV_PREFIX)
            .and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => {
                self.config.server.http_addr = value.to_string();
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["CACHE", "HOST"] => {
                self.config.cache.host = value.to_string();
            }
            ["CACHE", "PORT"] => {
                self.config.cache.port = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?;
            }
            ["CACHE", "DATABASE"] => {
                self.config.cache.database = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["TELEMETRY", "LOG_LEVEL"] => {
                self.config.telemetry.log_level = value.to_string();
            }
            ["TELEMETRY", "LOG_FORMAT"] => {
                self.config.telemetry.log_format = match value.to_lowercase().as_str() {
                    "json" => LogFormatSetting::Json,
                    "pretty" => LogFormatSetting::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOG_FILE"] => {
                self.config.telemetry.log_file =
                    (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ["TELEMETRY", "METRICS_ENABLED"] => {
                self.config.telemetry.metrics_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        ConfigLoader::new().with_vars(vars.iter().copied()).load()
    }

    #[test]
    fn test_defaults_without_vars() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_plain_service_vars() {
        let config = load(&[
            ("PORT", "8081"),
            ("REDIS_HOST", "redis.svc"),
            ("REDIS_PORT", "6380"),
            ("REDIS_DB", "3"),
        ])
        .unwrap();

        assert_eq!(config.server.http_addr, "0.0.0.0:8081");
        assert_eq!(config.cache.host, "redis.svc");
        assert_eq!(config.cache.port, 6380);
        assert_eq!(config.cache.database, 3);
    }

    #[test]
    fn test_prefixed_vars_win() {
        let config = load(&[
            ("CTXAPI__SERVER__HTTP_ADDR", "127.0.0.1:9999"),
            ("PORT", "8081"),
            ("CTXAPI__CACHE__HOST", "primary"),
            ("REDIS_HOST", "secondary"),
        ])
        .unwrap();

        assert_eq!(config.server.http_addr, "127.0.0.1:9999");
        assert_eq!(config.cache.host, "primary");
    }

    #[test]
    fn test_telemetry_vars() {
        let config = load(&[
            ("CTXAPI__TELEMETRY__LOG_LEVEL", "debug"),
            ("CTXAPI__TELEMETRY__LOG_FORMAT", "JSON"),
            ("CTXAPI__TELEMETRY__METRICS_ENABLED", "off"),
        ])
        .unwrap();

        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.telemetry.log_format, LogFormatSetting::Json);
        assert!(!config.telemetry.metrics_enabled);
    }

    #[test]
    fn test_body_limit_and_log_file_vars() {
        let config = load(&[
            ("CTXAPI__SERVER__MAX_BODY_BYTES", "2048"),
            ("CTXAPI__TELEMETRY__LOG_FILE", "/var/log/app.log"),
        ])
        .unwrap();

        assert_eq!(config.server.max_body_bytes, 2048);
        assert_eq!(
            config.telemetry.log_file.as_deref(),
            Some(Path::new("/var/log/app.log"))
        );

        let config = load(&[("CTXAPI__TELEMETRY__LOG_FILE", "")]).unwrap();
        assert!(config.telemetry.log_file.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("PORT", "http"),
            ("REDIS_PORT", "70000"),
            ("REDIS_DB", "zero"),
            ("CTXAPI__SERVER__MAX_BODY_BYTES", "100kb"),
            ("CTXAPI__TELEMETRY__LOG_FORMAT", "xml"),
            ("CTXAPI__TELEMETRY__METRICS_ENABLED", "maybe"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::EnvParseError { ref var, .. } if var == key),
                "{key}={value} gave {err}"
            );
        }
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let config = load(&[("HOME", "/root"), ("CTXAPI__UNKNOWN", "x")]).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cache]\nhost = \"from-file\"\nport = 7000").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .with_vars([("REDIS_PORT", "7001")])
            .load()
            .unwrap();

        assert_eq!(config.cache.host, "from-file");
        assert_eq!(config.cache.port, 7001);
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"server":{{"shutdown_timeout_secs":5}}}}"#).unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .with_vars(Vec::<(String, String)>::new())
            .load()
            .unwrap();
        assert_eq!(config.server.shutdown_timeout_secs, 5);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .with_file("/definitely/not/here.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        assert!(ConfigLoader::new()
            .with_optional_file("/definitely/not/here.toml")
            .is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
