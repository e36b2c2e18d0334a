//! Typed configuration for ctxapi.
//!
//! Settings are resolved in layers, later overriding earlier:
//!
//! 1. Built-in defaults
//! 2. An optional TOML or JSON file
//! 3. A `.env` file, merged into the process environment
//! 4. `PORT`, `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`
//! 5. `CTXAPI__SECTION__KEY` overrides
//!
//! Unknown fields in files are rejected.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:3000"
//! shutdown_timeout_secs = 30
//! max_body_bytes = 102400
//!
//! [cache]
//! host = "localhost"
//! port = 6379
//! database = 0
//!
//! [telemetry]
//! log_level = "info"
//! log_format = "pretty"
//! metrics_enabled = true
//! log_file = "/var/log/app.log"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::AppConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use schema::{
    CacheSection, LogFormatSetting, ServerSection, TelemetrySection, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_PORT,
};
