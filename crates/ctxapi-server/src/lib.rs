//! # ctxapi Server
//!
//! HTTP surface of ctxapi:
//!
//! - [`Router`]: method + path to [`Operation`]
//! - [`App`]: request dispatcher owning the context store and cache backend
//! - [`Server`]: hyper HTTP/1 accept loop with graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use ctxapi_cache::{CacheConfig, RedisCache};
//! use ctxapi_server::{App, Server};
//! use ctxapi_telemetry::MetricsRegistry;
//!
//! let cache = RedisCache::new(CacheConfig::default())?;
//! let app = App::new(Arc::new(cache), MetricsRegistry::detached());
//! Server::new(app, "0.0.0.0:3000".parse()?).run().await?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod shutdown;

pub use app::{App, BANNER};
pub use request::{CreateContextRequest, RequestBody, UpdateContextRequest};
pub use response::HttpResponse;
pub use router::{Operation, RouteMatch, Router};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionTracker, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
