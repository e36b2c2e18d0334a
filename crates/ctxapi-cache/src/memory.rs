//! In-process cache for tests.
//!
//! Keeps the counter in memory and can be told to fail. Available with the
//! `test-util` feature.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{CacheBackend, PONG};
use crate::error::CacheError;

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    hits: AtomicI64,
    failure: Mutex<Option<CacheError>>,
}

impl MemoryCache {
    /// Creates a cache with the counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `error`.
    pub fn fail_with(&self, error: CacheError) {
        *self.failure.lock() = Some(error);
    }

    /// Clears an injected failure.
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Returns the current counter value.
    #[must_use]
    pub fn hits(&self) -> i64 {
        self.hits.load(Ordering::SeqCst)
    }

    fn check(&self, command: &str) -> Result<(), CacheError> {
        match self.failure.lock().clone() {
            Some(error) => {
                error.log(command);
                Err(error)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn increment_hits(&self) -> Result<i64, CacheError> {
        self.check("INCR")?;
        Ok(self.hits.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn ping(&self) -> Result<String, CacheError> {
        self.check("PING")?;
        Ok(PONG.to_string())
    }
}
