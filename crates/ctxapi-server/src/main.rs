//! ctxapi - entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use ctxapi_cache::RedisCache;
use ctxapi_config::ConfigLoader;
use ctxapi_server::{App, Server};

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ctxapi {}", ctxapi_server::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"ctxapi - context CRUD service with cache-backed counters

USAGE:
    ctxapi [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    PORT                                    Listen port (default: 3000)
    REDIS_HOST                              Cache host (default: localhost)
    REDIS_PORT                              Cache port (default: 6379)
    REDIS_DB                                Cache database index (default: 0)
    CTXAPI__SERVER__HTTP_ADDR               Full listen address (default: 0.0.0.0:3000)
    CTXAPI__SERVER__SHUTDOWN_TIMEOUT_SECS   Graceful shutdown wait (default: 30)
    CTXAPI__SERVER__MAX_BODY_BYTES          Request body limit (default: 102400)
    CTXAPI__TELEMETRY__LOG_LEVEL            Log filter directive (default: info)
    CTXAPI__TELEMETRY__LOG_FORMAT           json or pretty (default: pretty)
    CTXAPI__TELEMETRY__LOG_FILE             Also append JSON logs to this file
    CTXAPI__TELEMETRY__METRICS_ENABLED      Record Prometheus metrics (default: true)

A .env file in the working directory is loaded before the environment is read.
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader
            .with_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }
    let config = loader
        .with_dotenv()
        .load()
        .context("invalid configuration")?;

    let metrics = ctxapi_telemetry::init_telemetry(&config.telemetry.to_telemetry_config())
        .context("failed to initialize telemetry")?;

    info!("Starting ctxapi v{}", ctxapi_server::VERSION);
    if let Some(path) = &args.config {
        info!("Loaded configuration from {}", path.display());
    }

    let cache_config = config.cache.to_cache_config();
    info!("Cache at {}", cache_config.url());
    let cache = RedisCache::new(cache_config).context("invalid cache configuration")?;

    let app = App::new(Arc::new(cache), metrics);
    let addr = config.socket_addr()?;

    Server::new(app, addr)
        .with_shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .with_max_body_bytes(config.server.max_body_bytes)
        .run()
        .await?;

    Ok(())
}
