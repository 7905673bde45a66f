//! # Micro Core
//!
//! Core types and traits shared by every micro crate.
//!
//! - [`Handler`] - The "handle a request" capability
//! - [`ResponseWriter`] - Buffered response writer handed to handlers
//! - [`ConnectionInfo`] - Per-connection metadata attached to requests
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/micro-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod handler;
mod response;

pub use context::{ConnectionInfo, RequestId};
pub use handler::{handler_fn, BoxFuture, BoxedHandler, Handler, HandlerFn};
pub use response::ResponseWriter;

/// Request type seen by handlers. The transport collects the body before dispatch.
pub type Request = http::Request<bytes::Bytes>;

/// Response type produced by [`ResponseWriter::into_response`].
pub type Response = http::Response<http_body_util::Full<bytes::Bytes>>;
