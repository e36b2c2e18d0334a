//! # ctxapi core
//!
//! Domain pieces of the ctxapi service that do not touch the network:
//!
//! - [`store`]: the in-memory context store with monotonic id allocation
//! - [`format`]: self-link decoration and response envelopes
//! - [`compute`]: Fibonacci and delay endpoints
//! - [`error`]: the request error taxonomy

#![doc(html_root_url = "https://docs.rs/ctxapi-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compute;
pub mod error;
pub mod format;
pub mod store;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use format::{ContextList, ContextView, DeleteResult, RequestOrigin, TaskEnvelope};
pub use store::{ContextPatch, ContextRecord, ContextStore, NewContext};
