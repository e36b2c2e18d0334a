//! HTTP server.
//!
//! A tokio `TcpListener` accept loop serving each connection with hyper's
//! HTTP/1 builder. Request bodies are collected in full, up to a size limit,
//! then handed to [`App::handle`]. Larger bodies get `413`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use ctxapi_cache::MemoryCache;
//! use ctxapi_server::{App, Server};
//! use ctxapi_telemetry::MetricsRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ctxapi_server::ServerError> {
//!     let app = App::new(Arc::new(MemoryCache::new()), MetricsRegistry::detached());
//!     Server::new(app, "0.0.0.0:3000".parse().unwrap()).run().await
//! }
//! ```

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use ctxapi_config::DEFAULT_MAX_BODY_BYTES;
use ctxapi_core::ApiError;

use crate::app::App;
use crate::response::{self, HttpResponse};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Default graceful shutdown wait.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The ctxapi HTTP server.
#[derive(Debug)]
pub struct Server {
    app: Arc<App>,
    http_addr: SocketAddr,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
}

impl Server {
    /// Creates a server for `app` listening on `http_addr`.
    #[must_use]
    pub fn new(app: App, http_addr: SocketAddr) -> Self {
        Self {
            app: Arc::new(app),
            http_addr,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Sets the largest accepted request body in bytes.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Returns the configured listen address.
    #[must_use]
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Returns the shared dispatcher.
    #[must_use]
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.http_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.http_addr,
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!("Server listening on http://{}", addr);

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let app = Arc::clone(&self.app);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();
                            let limit = self.max_body_bytes;

                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(app, stream, limit, shutdown).await {
                                    tracing::debug!("Connection error from {}: {}", remote_addr, e);
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        drop(listener);
        tracing::info!(
            "Waiting up to {:?} for {} connections to close",
            self.shutdown_timeout,
            tracker.active_connections()
        );

        tokio::select! {
            () = tracker.wait_for_drain() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(self.shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn serve_connection(
    app: Arc<App>,
    stream: TcpStream,
    max_body_bytes: usize,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let app = Arc::clone(&app);
        async move { Ok::<_, Infallible>(handle_request(&app, req, max_body_bytes).await) }
    });

    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            // Finish the in-flight request, then close
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

async fn handle_request<B>(app: &App, req: Request<B>, max_body_bytes: usize) -> HttpResponse
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();

    let body: Bytes = match Limited::new(body, max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            tracing::warn!(
                "{} {} rejected: body exceeds {} bytes",
                parts.method,
                parts.uri.path(),
                max_body_bytes
            );
            return response::error(&ApiError::PayloadTooLarge(max_body_bytes));
        }
        Err(e) => {
            tracing::warn!("Failed to collect request body: {}", e);
            return response::error(&ApiError::bad_request());
        }
    };

    app.handle(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxapi_cache::MemoryCache;
    use ctxapi_telemetry::MetricsRegistry;
    use http::StatusCode;
    use http_body_util::Full;

    fn app() -> App {
        App::new(Arc::new(MemoryCache::new()), MetricsRegistry::detached())
    }

    fn server(addr: &str) -> Server {
        Server::new(app(), addr.parse().unwrap())
    }

    fn post(body: String) -> Request<Full<Bytes>> {
        Request::post("/api/post/context")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    #[test]
    fn test_server_new() {
        let server = server("127.0.0.1:3000").with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(server.http_addr().port(), 3000);
        assert_eq!(server.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(server.max_body_bytes, 100 * 1024);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let app = app();
        let title = "a".repeat(200);
        let response = handle_request(&app, post(format!(r#"{{"title":"{title}"}}"#)), 100).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"error":"Payload too large"}"#);
        assert_eq!(app.store_snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_body_within_limit_accepted() {
        let app = app();
        let body = r#"{"title":"Rocky 9"}"#.to_string();
        let limit = body.len();
        let response = handle_request(&app, post(body), limit).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(app.store_snapshot().len(), 5);
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let server = server("127.0.0.1:0").with_shutdown_timeout(Duration::from_millis(100));

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.run_with_shutdown(shutdown),
        )
        .await;

        assert!(result.expect("server should stop").is_ok());
    }

    #[tokio::test]
    async fn test_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = server(&addr.to_string())
            .run_with_shutdown(ShutdownSignal::new())
            .await;

        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Io(std::io::Error::other("connection reset"));
        assert!(err.to_string().contains("I/O error"));
    }
}
