//! Request routing and path matching.
//!
//! Maps a method and path to an [`Operation`]. Path templates use
//! `{param}` segments; captured values are percent-decoded and validated
//! by the dispatcher.
//!
//! # Example
//!
//! ```rust
//! use ctxapi_server::router::{Operation, Router};
//! use http::Method;
//!
//! let router = Router::api();
//!
//! let m = router.match_route(&Method::GET, "/api/get/context/42").unwrap();
//! assert_eq!(m.operation(), Operation::GetContext);
//! assert_eq!(m.param("id"), Some("42"));
//! assert_eq!(m.pattern(), "/api/get/context/{id}");
//!
//! assert!(router.match_route(&Method::POST, "/api/get/context").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;

use http::Method;
use percent_encoding::percent_decode_str;

/// Every operation the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /api/get/context`
    ListContexts,
    /// `GET /api/get/context/{id}`
    GetContext,
    /// `POST /api/post/context`
    CreateContext,
    /// `PUT /api/put/context/{id}`
    UpdateContext,
    /// `DELETE /api/delete/context/{id}`
    DeleteContext,
    /// `GET /api/fib/{n}`
    Fibonacci,
    /// `GET /api/sleep/{seconds}`
    Sleep,
    /// `GET /api/count`
    Count,
    /// `GET /api/redisping`
    RedisPing,
    /// `GET /metrics`
    Metrics,
    /// `GET /`
    Banner,
}

impl Operation {
    /// Returns a stable camelCase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ListContexts => "listContexts",
            Self::GetContext => "getContext",
            Self::CreateContext => "createContext",
            Self::UpdateContext => "updateContext",
            Self::DeleteContext => "deleteContext",
            Self::Fibonacci => "fibonacci",
            Self::Sleep => "sleep",
            Self::Count => "count",
            Self::RedisPing => "redisPing",
            Self::Metrics => "metrics",
            Self::Banner => "banner",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A matched route with extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation: Operation,
    pattern: &'static str,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the matched operation.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the path template that matched.
    ///
    /// Used as the `route` metric label so ids never inflate cardinality.
    #[must_use]
    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(&'static str),
    Param(&'static str),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    pattern: &'static str,
    segments: Vec<PathSegment>,
    operation: Operation,
}

impl Route {
    fn new(method: Method, pattern: &'static str, operation: Operation) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name),
                None => PathSegment::Literal(s),
            })
            .collect();

        Self {
            method,
            pattern,
            segments,
            operation,
        }
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if *expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    let value = percent_decode_str(actual).decode_utf8_lossy();
                    params.insert((*name).to_string(), value.into_owned());
                }
            }
        }

        Some(params)
    }
}

/// HTTP request router.
///
/// Routes are checked in registration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Creates the router holding the service's full route table.
    #[must_use]
    pub fn api() -> Self {
        let mut router = Self::new();
        router.add_route(Method::GET, "/api/get/context", Operation::ListContexts);
        router.add_route(Method::GET, "/api/get/context/{id}", Operation::GetContext);
        router.add_route(Method::POST, "/api/post/context", Operation::CreateContext);
        router.add_route(Method::PUT, "/api/put/context/{id}", Operation::UpdateContext);
        router.add_route(
            Method::DELETE,
            "/api/delete/context/{id}",
            Operation::DeleteContext,
        );
        router.add_route(Method::GET, "/api/fib/{n}", Operation::Fibonacci);
        router.add_route(Method::GET, "/api/sleep/{seconds}", Operation::Sleep);
        router.add_route(Method::GET, "/api/count", Operation::Count);
        router.add_route(Method::GET, "/api/redisping", Operation::RedisPing);
        router.add_route(Method::GET, "/metrics", Operation::Metrics);
        router.add_route(Method::GET, "/", Operation::Banner);
        router
    }

    /// Adds a route.
    pub fn add_route(&mut self, method: Method, pattern: &'static str, operation: Operation) {
        self.routes.push(Route::new(method, pattern, operation));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a request to a route.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            if route.method != *method {
                return None;
            }
            route.match_path(path).map(|params| RouteMatch {
                operation: route.operation,
                pattern: route.pattern,
                params,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_route_table() {
        let router = Router::api();
        assert_eq!(router.route_count(), 11);

        let cases = [
            (Method::GET, "/api/get/context", Operation::ListContexts),
            (Method::GET, "/api/get/context/1", Operation::GetContext),
            (Method::POST, "/api/post/context", Operation::CreateContext),
            (Method::PUT, "/api/put/context/1", Operation::UpdateContext),
            (Method::DELETE, "/api/delete/context/1", Operation::DeleteContext),
            (Method::GET, "/api/fib/10", Operation::Fibonacci),
            (Method::GET, "/api/sleep/0", Operation::Sleep),
            (Method::GET, "/api/count", Operation::Count),
            (Method::GET, "/api/redisping", Operation::RedisPing),
            (Method::GET, "/metrics", Operation::Metrics),
            (Method::GET, "/", Operation::Banner),
        ];

        for (method, path, expected) in cases {
            let m = router
                .match_route(&method, path)
                .unwrap_or_else(|| panic!("{method} {path} should match"));
            assert_eq!(m.operation(), expected);
        }
    }

    #[test]
    fn test_param_extraction() {
        let router = Router::api();
        let m = router.match_route(&Method::GET, "/api/fib/abc").unwrap();
        assert_eq!(m.param("n"), Some("abc"));
        assert_eq!(m.param("id"), None);
        assert_eq!(m.pattern(), "/api/fib/{n}");
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let router = Router::api();

        let m = router.match_route(&Method::GET, "/api/get/context/%31%32").unwrap();
        assert_eq!(m.param("id"), Some("12"));

        let m = router.match_route(&Method::GET, "/api/fib/1%20").unwrap();
        assert_eq!(m.param("n"), Some("1 "));

        // Malformed escapes pass through unchanged
        let m = router.match_route(&Method::GET, "/api/fib/%zz").unwrap();
        assert_eq!(m.param("n"), Some("%zz"));
    }

    #[test]
    fn test_method_mismatch() {
        let router = Router::api();
        assert!(router.match_route(&Method::DELETE, "/api/get/context/1").is_none());
        assert!(router.match_route(&Method::POST, "/api/count").is_none());
    }

    #[test]
    fn test_segment_count_mismatch() {
        let router = Router::api();
        assert!(router.match_route(&Method::GET, "/api/get/context/1/extra").is_none());
        assert!(router.match_route(&Method::GET, "/api/fib").is_none());
        assert!(router.match_route(&Method::GET, "/unknown").is_none());
    }

    #[test]
    fn test_trailing_slash_matches() {
        let router = Router::api();
        let m = router.match_route(&Method::GET, "/api/count/").unwrap();
        assert_eq!(m.operation(), Operation::Count);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::RedisPing.to_string(), "redisPing");
        assert_eq!(Operation::ListContexts.name(), "listContexts");
    }
}
