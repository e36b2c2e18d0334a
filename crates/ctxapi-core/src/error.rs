//! Error taxonomy for request handling.
//!
//! Every failure inside a handler is expressed as an [`ApiError`]. The
//! dispatcher converts it into an HTTP status and a `{"error": ...}` body
//! at the handler boundary, so no error ever escapes to the connection.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used for malformed create/update requests.
pub const BAD_REQUEST: &str = "Bad request";

/// Message used for unknown ids and unmatched routes.
pub const NOT_FOUND: &str = "Not found";

/// Message surfaced to clients for any cache failure.
pub const CACHE_ERROR: &str = "Redis error";

/// Message used when a request body exceeds the configured limit.
pub const PAYLOAD_TOO_LARGE: &str = "Payload too large";

/// Errors produced while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// No record with the requested id.
    #[error("context {0} not found")]
    NotFound(u64),

    /// The cache refused the connection or could not be reached.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// The cache was reachable but the command failed.
    #[error("cache error: {0}")]
    Cache(String),

    /// The request body exceeds the limit in bytes.
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// No route matches the method and path.
    #[error("no route for {method} {path}")]
    RouteNotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },
}

impl ApiError {
    /// Creates a validation error with the generic `Bad request` message.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::Validation(BAD_REQUEST.to_string())
    }

    /// Creates a validation error with a custom message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::CacheUnavailable(_) | Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the client-facing error body.
    ///
    /// Internal detail (ids, cache messages) never leaks into the body.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let message = match self {
            Self::Validation(msg) => msg.as_str(),
            Self::NotFound(_) | Self::RouteNotFound { .. } => NOT_FOUND,
            Self::PayloadTooLarge(_) => PAYLOAD_TOO_LARGE,
            Self::CacheUnavailable(_) | Self::Cache(_) => CACHE_ERROR,
        };
        ErrorBody::new(message)
    }
}

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short, client-facing message.
    pub error: String,
}

impl ErrorBody {
    /// Creates a new error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Result alias for request handling.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::RouteNotFound {
                method: "GET".to_string(),
                path: "/nope".to_string(),
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::CacheUnavailable("refused".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Cache("WRONGTYPE".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::PayloadTooLarge(100).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_cache_errors_share_one_body() {
        let unavailable = ApiError::CacheUnavailable("refused".to_string()).body();
        let failed = ApiError::Cache("WRONGTYPE".to_string()).body();
        assert_eq!(unavailable, failed);
        assert_eq!(unavailable.error, "Redis error");
    }

    #[test]
    fn test_not_found_body_hides_id() {
        let body = serde_json::to_value(ApiError::NotFound(9999).body()).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Not found" }));
    }

    #[test]
    fn test_validation_keeps_message() {
        let err = ApiError::validation("Bad request: seconds must be a non-negative integer");
        assert_eq!(
            err.body().error,
            "Bad request: seconds must be a non-negative integer"
        );
        assert_eq!(err.to_string(), err.body().error);
    }
}
