//! Radix tree routing for micro services.
//!
//! This crate is the routing capability of the runtime: endpoints are
//! registered for a method and a path pattern through [`RouteRegistry`], and
//! the frozen registry is itself a [`micro_core::Handler`] that the server
//! uses as its top-level handler.
//!
//! # Features
//!
//! - **Radix Tree Matching**: lookup cost follows the path length, not the route count
//! - **Path Parameters**: `/users/{id}`, stored in request extensions as [`Params`]
//! - **Wildcards**: catch-all routes (`/files/*path`)
//! - **Method Dispatch**: 405 with an `Allow` header for known paths
//!
//! # Example
//!
//! ```rust
//! use micro_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.route(Method::GET, "/users/{id}", "getUser").unwrap();
//! router.route(Method::GET, "/files/*path", "serveFile").unwrap();
//!
//! let found = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(*found.target, "getUser");
//! assert_eq!(found.params.get("id"), Some("123"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!              [GET,DELETE]
//! ```

mod error;
mod handler;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use handler::{HandlerRouter, RouteRegistry};
pub use method_router::MethodRouter;
pub use params::Params;
pub use router::Router;

/// A matched route with its target and extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The target registered for the route.
    pub target: &'a T,
    /// Extracted path parameters.
    pub params: Params,
}
