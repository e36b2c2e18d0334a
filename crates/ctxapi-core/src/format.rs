//! Response shaping for context records.
//!
//! Records are never sent as-is: every record leaving the service carries a
//! `uri` self-link derived from the origin the client used to reach us.

use http::header::HOST;
use http::HeaderMap;
use http::Uri;
use serde::{Deserialize, Serialize};

use crate::store::ContextRecord;

/// Path prefix of the canonical get-endpoint.
pub const CONTEXT_PATH: &str = "/api/get/context";

/// Scheme and host the client used for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    scheme: String,
    host: String,
}

impl RequestOrigin {
    /// Creates an origin from its parts.
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Derives the origin from a request URI and headers.
    ///
    /// Scheme: absolute URI, then `X-Forwarded-Proto`, else `http`.
    /// Host: `Host` header, then URI authority, else `localhost`.
    #[must_use]
    pub fn from_parts(uri: &Uri, headers: &HeaderMap) -> Self {
        let scheme = uri
            .scheme_str()
            .map(str::to_string)
            .or_else(|| {
                headers
                    .get("x-forwarded-proto")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());

        Self { scheme, host }
    }

    /// Returns the scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the host (with port, if the client sent one).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Builds the canonical URI of a record.
#[must_use]
pub fn self_link(scheme: &str, host: &str, id: u64) -> String {
    format!("{scheme}://{host}{CONTEXT_PATH}/{id}")
}

/// A record decorated with its self-link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextView {
    /// The record's own fields.
    #[serde(flatten)]
    pub record: ContextRecord,

    /// Canonical URI of the record.
    pub uri: String,
}

impl ContextView {
    /// Decorates a record for the given origin.
    #[must_use]
    pub fn new(record: ContextRecord, origin: &RequestOrigin) -> Self {
        let uri = self_link(origin.scheme(), origin.host(), record.id);
        Self { record, uri }
    }
}

/// Body of the list endpoint: `{"context": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextList {
    /// All records, in store order.
    pub context: Vec<ContextView>,
}

impl ContextList {
    /// Decorates every record in `records`.
    #[must_use]
    pub fn new<'a>(
        records: impl IntoIterator<Item = &'a ContextRecord>,
        origin: &RequestOrigin,
    ) -> Self {
        Self {
            context: records
                .into_iter()
                .map(|record| ContextView::new(record.clone(), origin))
                .collect(),
        }
    }
}

/// Body of single-record endpoints: `{"task": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    /// The decorated record.
    pub task: ContextView,
}

impl TaskEnvelope {
    /// Wraps a record.
    #[must_use]
    pub fn new(record: ContextRecord, origin: &RequestOrigin) -> Self {
        Self {
            task: ContextView::new(record, origin),
        }
    }
}

/// Body of the delete endpoint: `{"result": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Whether the record was removed.
    pub result: bool,
}
