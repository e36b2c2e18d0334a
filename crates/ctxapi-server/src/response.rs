//! Response builders.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

use ctxapi_core::ApiError;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Content type of JSON responses.
pub const JSON: &str = "application/json";

/// Content type of plain-text responses.
pub const TEXT: &str = "text/plain; charset=utf-8";

/// Builds a response with the given content type.
pub fn with_content_type(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> HttpResponse {
    let body = body.into();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|_| {
            let mut response = Response::new(Full::new(body));
            *response.status_mut() = status;
            response
        })
}

/// Serializes `value` as a JSON response.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => with_content_type(status, JSON, body),
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            with_content_type(
                StatusCode::INTERNAL_SERVER_ERROR,
                JSON,
                r#"{"error":"Internal error"}"#,
            )
        }
    }
}

/// Builds a plain-text response.
pub fn text(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    with_content_type(status, TEXT, body.into())
}

/// Builds the `{"error": ...}` response for `error`.
pub fn error(error: &ApiError) -> HttpResponse {
    json(error.status_code(), &error.body())
}
