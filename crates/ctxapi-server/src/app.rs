//! Request dispatcher.
//!
//! [`App`] owns every piece of request-handling state: the route table,
//! the context store, the cache backend and the metrics registry. The
//! server hands it fully collected requests; tests can do the same
//! without a socket.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use ctxapi_cache::MemoryCache;
//! use ctxapi_server::App;
//! use ctxapi_telemetry::MetricsRegistry;
//! use http::{Request, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let app = App::new(Arc::new(MemoryCache::new()), MetricsRegistry::detached());
//!
//! let request = Request::get("/api/fib/10").body(Bytes::new()).unwrap();
//! let response = app.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::request::Parts;
use http::{Request, StatusCode};
use parking_lot::Mutex;

use ctxapi_cache::{CacheBackend, CacheError};
use ctxapi_core::compute::{self, FIB_INVALID, SLEEP_INVALID};
use ctxapi_core::{
    ApiError, ApiResult, ContextList, ContextPatch, ContextRecord, ContextStore, DeleteResult,
    RequestOrigin, TaskEnvelope,
};
use ctxapi_telemetry::metrics::{record_cache_error, record_request};
use ctxapi_telemetry::{InFlightGuard, MetricsRegistry};

use crate::request::{CreateContextRequest, RequestBody, UpdateContextRequest};
use crate::response::{self, HttpResponse};
use crate::router::{Operation, RouteMatch, Router};

/// Text served on `/`.
pub const BANNER: &str = "ctxapi is running!";

/// Metric label for requests that match no route.
const UNMATCHED_ROUTE: &str = "unmatched";

/// The request dispatcher.
pub struct App {
    router: Router,
    store: Mutex<ContextStore>,
    cache: Arc<dyn CacheBackend>,
    metrics: MetricsRegistry,
}

impl App {
    /// Creates an app over the seeded store.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheBackend>, metrics: MetricsRegistry) -> Self {
        Self::with_store(ContextStore::seeded(), cache, metrics)
    }

    /// Creates an app over the given store.
    #[must_use]
    pub fn with_store(
        store: ContextStore,
        cache: Arc<dyn CacheBackend>,
        metrics: MetricsRegistry,
    ) -> Self {
        Self {
            router: Router::api(),
            store: Mutex::new(store),
            cache,
            metrics,
        }
    }

    /// Returns a snapshot of the store.
    #[must_use]
    pub fn store_snapshot(&self) -> ContextStore {
        self.store.lock().clone()
    }

    /// Handles one request. Never fails: every error becomes a response.
    pub async fn handle(&self, request: Request<Bytes>) -> HttpResponse {
        let (parts, body) = request.into_parts();
        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        tracing::info!("{} {} {:?}", parts.method, path, parts.version);

        let _in_flight = InFlightGuard::new();
        let start = Instant::now();

        let route = self.router.match_route(&parts.method, parts.uri.path());
        let label = route.as_ref().map_or(UNMATCHED_ROUTE, RouteMatch::pattern);

        let response = match route {
            Some(route) => self
                .dispatch(&route, &parts, &body)
                .await
                .unwrap_or_else(|e| Self::reject(route.operation(), &e)),
            None => response::error(&ApiError::RouteNotFound {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
            }),
        };

        record_request(
            parts.method.as_str(),
            label,
            response.status().as_u16(),
            start.elapsed(),
        );
        response
    }

    fn reject(operation: Operation, error: &ApiError) -> HttpResponse {
        match error {
            ApiError::Validation(_)
            | ApiError::NotFound(_)
            | ApiError::PayloadTooLarge(_)
            | ApiError::RouteNotFound { .. } => {
                tracing::debug!(%operation, "{}", error);
            }
            // Already logged by the cache adapter
            ApiError::CacheUnavailable(_) | ApiError::Cache(_) => {}
        }
        response::error(error)
    }

    async fn dispatch(
        &self,
        route: &RouteMatch,
        parts: &Parts,
        body: &Bytes,
    ) -> ApiResult<HttpResponse> {
        let origin = || RequestOrigin::from_parts(&parts.uri, &parts.headers);

        match route.operation() {
            Operation::ListContexts => {
                let list = ContextList::new(self.store.lock().list(), &origin());
                Ok(response::json(StatusCode::OK, &list))
            }
            Operation::GetContext => {
                let id = context_id(route, parts)?;
                let record = self.store.lock().get(id)?.clone();
                Ok(response::json(
                    StatusCode::OK,
                    &TaskEnvelope::new(record, &origin()),
                ))
            }
            Operation::CreateContext => {
                let request: CreateContextRequest = RequestBody::parse(&parts.headers, body)
                    .decode()?
                    .ok_or_else(ApiError::bad_request)?;
                let record = self.store.lock().create(request.into())?;
                Ok(response::json(
                    StatusCode::CREATED,
                    &TaskEnvelope::new(record, &origin()),
                ))
            }
            Operation::UpdateContext => {
                let id = context_id(route, parts)?;
                let record = self.update_context(id, &RequestBody::parse(&parts.headers, body))?;
                Ok(response::json(
                    StatusCode::OK,
                    &TaskEnvelope::new(record, &origin()),
                ))
            }
            Operation::DeleteContext => {
                let id = context_id(route, parts)?;
                let result = self.store.lock().delete(id)?;
                Ok(response::json(StatusCode::OK, &DeleteResult { result }))
            }
            Operation::Fibonacci => {
                let n =
                    compute::parse_non_negative(route.param("n").unwrap_or_default(), FIB_INVALID)?;
                let term = compute::fibonacci(n)?;
                Ok(response::text(StatusCode::OK, term.to_string()))
            }
            Operation::Sleep => {
                let seconds = compute::parse_non_negative(
                    route.param("seconds").unwrap_or_default(),
                    SLEEP_INVALID,
                )?;
                Ok(response::text(StatusCode::OK, compute::delay(seconds).await))
            }
            Operation::Count => {
                let hits = self.cache.increment_hits().await.map_err(cache_failure)?;
                Ok(response::text(StatusCode::OK, hits.to_string()))
            }
            Operation::RedisPing => {
                let reply = self.cache.ping().await.map_err(cache_failure)?;
                Ok(response::text(StatusCode::OK, reply))
            }
            Operation::Metrics => Ok(response::with_content_type(
                StatusCode::OK,
                self.metrics.content_type(),
                self.metrics.render(),
            )),
            Operation::Banner => Ok(response::text(StatusCode::OK, BANNER)),
        }
    }

    /// Unknown ids are reported before an absent body.
    fn update_context(&self, id: u64, body: &RequestBody) -> ApiResult<ContextRecord> {
        let mut store = self.store.lock();
        store.get(id)?;

        let patch: ContextPatch = body
            .decode::<UpdateContextRequest>()?
            .ok_or_else(ApiError::bad_request)?
            .into();
        store.update(id, &patch)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.route_count())
            .field("contexts", &self.store.lock().len())
            .finish_non_exhaustive()
    }
}

/// Parses the `{id}` segment. A non-integer id names no record.
fn context_id(route: &RouteMatch, parts: &Parts) -> ApiResult<u64> {
    route
        .param("id")
        .filter(|raw| !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ApiError::RouteNotFound {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
        })
}

fn cache_failure(error: CacheError) -> ApiError {
    record_cache_error(error.kind());
    error.into()
}
