//! # ctxapi cache
//!
//! Adapter for the external key-value cache behind `/api/count` and
//! `/api/redisping`.
//!
//! Failures are split in two: [`CacheError::Unavailable`] when the cache
//! cannot be reached, which is routine while it is still starting and is
//! logged at `warn`, and [`CacheError::Operation`] for everything else,
//! logged at `error`. Callers see both as a single generic cache error.
//!
//! ```rust,no_run
//! use ctxapi_cache::{CacheBackend, CacheConfig, RedisCache};
//!
//! # async fn run() -> Result<(), ctxapi_cache::CacheError> {
//! let cache = RedisCache::new(CacheConfig::new("localhost", 6379))?;
//! let hits = cache.increment_hits().await?;
//! println!("seen {hits} times");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/ctxapi-cache/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
#[cfg(any(test, feature = "test-util"))]
mod memory;

pub use client::{CacheBackend, RedisCache, PONG};
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryCache;
pub use config::{CacheConfig, DEFAULT_HOST, DEFAULT_PORT, HITS_KEY};
pub use error::CacheError;
