//! Cache error classification.

use ctxapi_core::ApiError;
use thiserror::Error;

/// Failures reported by a [`CacheBackend`](crate::CacheBackend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache could not be reached (connection refused, reset, I/O).
    ///
    /// Expected while the cache is still starting; logged at `warn`.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The cache answered with an error.
    #[error("cache operation failed: {0}")]
    Operation(String),
}

impl CacheError {
    /// Short label for metrics (`unavailable` or `operation`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Operation(_) => "operation",
        }
    }

    /// Emits the log event matching this error's severity.
    pub fn log(&self, command: &str) {
        match self {
            Self::Unavailable(msg) => {
                tracing::warn!(command, error = %msg, "Cache connection refused, is the cache running?");
            }
            Self::Operation(msg) => {
                tracing::error!(command, error = %msg, "Cache command failed");
            }
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_connection_refusal() || error.is_io_error() || error.is_connection_dropped() {
            Self::Unavailable(error.to_string())
        } else {
            Self::Operation(error.to_string())
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Unavailable(msg) => Self::CacheUnavailable(msg),
            CacheError::Operation(msg) => Self::Cache(msg),
        }
    }
}
