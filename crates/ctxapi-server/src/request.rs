//! Request body decoding.
//!
//! Bodies are accepted as JSON objects or URL-encoded forms. A body that
//! is empty, malformed, or a JSON value other than an object counts as
//! absent. A body that parses but carries a field of the wrong type is a
//! validation error.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use ctxapi_core::{ApiError, ApiResult, ContextPatch, NewContext};

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No usable body.
    Absent,
    /// A JSON object.
    Json(Map<String, Value>),
    /// A URL-encoded form, still encoded.
    Form(String),
}

impl RequestBody {
    /// Classifies a raw body using the `Content-Type` header.
    ///
    /// Without a recognized content type, the body is tried as JSON.
    #[must_use]
    pub fn parse(headers: &HeaderMap, body: &Bytes) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::Absent;
        }

        let mime = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("application/x-www-form-urlencoded") => match std::str::from_utf8(body) {
                Ok(form) => Self::Form(form.to_string()),
                Err(_) => Self::Absent,
            },
            _ => Self::json(body),
        }
    }

    fn json(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(Value::Object(map)) => Self::Json(map),
            Ok(_) => Self::Absent,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed JSON body");
                Self::Absent
            }
        }
    }

    /// Returns `true` if there is no usable body.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Decodes the body into `T`.
    ///
    /// Returns `Ok(None)` for an absent body and a `Bad request` validation
    /// error when a field has the wrong type.
    pub fn decode<T: DeserializeOwned>(&self) -> ApiResult<Option<T>> {
        let decoded = match self {
            Self::Absent => return Ok(None),
            Self::Json(map) => serde_json::from_value(Value::Object(map.clone()))
                .map_err(|e| e.to_string()),
            Self::Form(form) => serde_urlencoded::from_str(form).map_err(|e| e.to_string()),
        };

        decoded.map(Some).map_err(|reason| {
            tracing::debug!(%reason, "Rejecting request body");
            ApiError::bad_request()
        })
    }
}

/// Body of `POST /api/post/context`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateContextRequest {
    /// Required, non-empty.
    #[serde(default)]
    pub title: Option<String>,

    /// Defaults to empty.
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateContextRequest> for NewContext {
    fn from(req: CreateContextRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
        }
    }
}

/// Body of `PUT /api/put/context/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateContextRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,

    /// New description.
    #[serde(default)]
    pub description: Option<String>,

    /// New completion flag.
    #[serde(default)]
    pub done: Option<bool>,
}

impl From<UpdateContextRequest> for ContextPatch {
    fn from(req: UpdateContextRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            done: req.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    fn parse(content_type: &str, body: &'static str) -> RequestBody {
        RequestBody::parse(&headers(content_type), &Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn test_json_object() {
        let body = parse("application/json", r#"{"title":"Rocky 9"}"#);
        let req: CreateContextRequest = body.decode().unwrap().unwrap();
        assert_eq!(req.title.as_deref(), Some("Rocky 9"));
        assert_eq!(req.description, None);
    }

    #[test]
    fn test_json_with_charset() {
        let body = parse("application/json; charset=utf-8", r#"{"done":true}"#);
        let req: UpdateContextRequest = body.decode().unwrap().unwrap();
        assert_eq!(req.done, Some(true));
    }

    #[test]
    fn test_empty_body_is_absent() {
        assert!(parse("application/json", "").is_absent());
        assert!(parse("application/json", "  \n").is_absent());
        assert!(RequestBody::parse(&HeaderMap::new(), &Bytes::new()).is_absent());
    }

    #[test]
    fn test_malformed_json_is_absent() {
        assert!(parse("application/json", "{not json").is_absent());
        assert!(parse("application/json", "[1, 2]").is_absent());
        assert!(parse("application/json", "\"title\"").is_absent());
    }

    #[test]
    fn test_missing_content_type_tries_json() {
        let body = RequestBody::parse(
            &HeaderMap::new(),
            &Bytes::from_static(br#"{"title":"x"}"#),
        );
        assert!(matches!(body, RequestBody::Json(_)));

        let body = RequestBody::parse(&HeaderMap::new(), &Bytes::from_static(b"title=x"));
        assert!(body.is_absent());
    }

    #[test]
    fn test_form_body() {
        let body = parse(
            "application/x-www-form-urlencoded",
            "title=Alma+9&description=RHEL%209%20based&done=true",
        );
        let req: UpdateContextRequest = body.decode().unwrap().unwrap();
        assert_eq!(req.title.as_deref(), Some("Alma 9"));
        assert_eq!(req.description.as_deref(), Some("RHEL 9 based"));
        assert_eq!(req.done, Some(true));
    }

    #[test]
    fn test_form_bad_bool() {
        let body = parse("application/x-www-form-urlencoded", "done=yes");
        let err = body.decode::<UpdateContextRequest>().unwrap_err();
        assert_eq!(err, ApiError::bad_request());
    }

    #[test]
    fn test_wrong_json_types_rejected() {
        for raw in [
            r#"{"title": 5}"#,
            r#"{"description": false}"#,
            r#"{"done": "true"}"#,
        ] {
            let body = RequestBody::Json(serde_json::from_str(raw).unwrap());
            assert_eq!(
                body.decode::<UpdateContextRequest>().unwrap_err(),
                ApiError::bad_request(),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let body = parse("application/json", r#"{"priority": 1, "done": false}"#);
        let req: UpdateContextRequest = body.decode().unwrap().unwrap();
        assert_eq!(req.done, Some(false));
        assert_eq!(req.title, None);
    }

    #[test]
    fn test_null_is_not_supplied() {
        let body = parse("application/json", r#"{"title": null}"#);
        let patch: ContextPatch = body
            .decode::<UpdateContextRequest>()
            .unwrap()
            .unwrap()
            .into();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_absent_decodes_to_none() {
        let decoded = RequestBody::Absent.decode::<CreateContextRequest>().unwrap();
        assert_eq!(decoded, None);
    }
}
