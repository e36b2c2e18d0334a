//! Cache backends.
//!
//! [`RedisCache`] talks to a real Redis server.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tokio::sync::OnceCell;

use crate::config::CacheConfig;
use crate::error::CacheError;

/// Liveness token returned by a healthy cache.
pub const PONG: &str = "PONG";

/// The two cache operations the service relies on.
///
/// Implementations never retry: each call either succeeds or reports a
/// single [`CacheError`].
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Increments the hit counter and returns the new value.
    async fn increment_hits(&self) -> Result<i64, CacheError>;

    /// Returns the cache's liveness token.
    async fn ping(&self) -> Result<String, CacheError>;
}

/// Redis-backed cache.
///
/// The connection is opened on first use. If that fails the next call tries
/// again, so the service can start before the cache does. Once open, the
/// [`ConnectionManager`] reconnects on its own.
pub struct RedisCache {
    client: redis::Client,
    config: CacheConfig,
    connection: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Creates a cache client. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Operation`] if the configuration does not form
    /// a valid connection URL.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url())?;
        Ok(Self {
            client,
            config,
            connection: OnceCell::new(),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                tracing::debug!(url = %self.config.url(), "Connecting to cache");
                // Retries belong to the caller; the first refusal is reported as-is.
                let manager_config = ConnectionManagerConfig::new().set_number_of_retries(0);
                self.client
                    .get_connection_manager_with_config(manager_config)
                    .await
            })
            .await?;
        Ok(manager.clone())
    }

    async fn run<T: redis::FromRedisValue + Send>(
        &self,
        name: &str,
        cmd: redis::Cmd,
    ) -> Result<T, CacheError> {
        let result = match self.connection().await {
            Ok(mut conn) => cmd.query_async::<T>(&mut conn).await.map_err(CacheError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            e.log(name);
        }
        result
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn increment_hits(&self) -> Result<i64, CacheError> {
        let mut cmd = redis::cmd("INCR");
        cmd.arg(&self.config.hits_key);
        self.run("INCR", cmd).await
    }

    async fn ping(&self) -> Result<String, CacheError> {
        self.run("PING", redis::cmd("PING")).await
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("url", &self.config.url())
            .field("connected", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}
