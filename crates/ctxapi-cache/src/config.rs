//! Cache connection settings.

/// Default cache host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default cache port.
pub const DEFAULT_PORT: u16 = 6379;

/// Key holding the hit counter.
pub const HITS_KEY: &str = "hits";

/// Where the external cache lives.
///
/// # Example
///
/// ```rust
/// use ctxapi_cache::CacheConfig;
///
/// let config = CacheConfig::new("redis.internal", 6380).with_database(2);
/// assert_eq!(config.url(), "redis://redis.internal:6380/2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Host name or address.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Logical database index.
    pub database: i64,

    /// Key incremented by the hit counter.
    pub hits_key: String,
}

impl CacheConfig {
    /// Creates a configuration for `host:port`, database 0.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the logical database index.
    #[must_use]
    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    /// Sets the counter key.
    #[must_use]
    pub fn with_hits_key(mut self, key: impl Into<String>) -> Self {
        self.hits_key = key.into();
        self
    }

    /// Returns the connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.database)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: 0,
            hits_key: HITS_KEY.to_string(),
        }
    }
}
