//! Endpoint definitions.

use std::fmt;
use std::sync::Arc;

use http::Method;
use micro_core::{BoxedHandler, Handler};
use micro_middleware::EndpointDecorator;

/// A named route: method, URI pattern, base handler and its decorators.
///
/// # Example
///
/// ```
/// use micro_core::handler_fn;
/// use micro_service::Endpoint;
///
/// let endpoint = Endpoint::get("hello", "/", handler_fn(|w, _r| {
///     Box::pin(async move {
///         w.write("World");
///     })
/// }))
/// .before(handler_fn(|w, _r| Box::pin(async move { w.write("Hello "); })))
/// .after(handler_fn(|w, _r| Box::pin(async move { w.write("!"); })));
///
/// assert_eq!(endpoint.name(), "hello");
/// assert_eq!(endpoint.decorator_count(), 2);
/// ```
pub struct Endpoint {
    pub(crate) name: String,
    pub(crate) method: Method,
    pub(crate) pattern: String,
    pub(crate) handler: BoxedHandler,
    pub(crate) decorators: Vec<EndpointDecorator>,
}

impl Endpoint {
    /// Creates an endpoint. The name becomes the span name when tracing is on.
    pub fn new(
        name: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: impl Handler,
    ) -> Self {
        Self::from_boxed(name, method, pattern, Arc::new(handler))
    }

    /// Creates an endpoint from an already shared handler.
    pub fn from_boxed(
        name: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: BoxedHandler,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            pattern: pattern.into(),
            handler,
            decorators: Vec::new(),
        }
    }

    /// `GET` endpoint.
    pub fn get(name: impl Into<String>, pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(name, Method::GET, pattern, handler)
    }

    /// `POST` endpoint.
    pub fn post(name: impl Into<String>, pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(name, Method::POST, pattern, handler)
    }

    /// `PUT` endpoint.
    pub fn put(name: impl Into<String>, pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(name, Method::PUT, pattern, handler)
    }

    /// `DELETE` endpoint.
    pub fn delete(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: impl Handler,
    ) -> Self {
        Self::new(name, Method::DELETE, pattern, handler)
    }

    /// Appends a decorator. Order is kept.
    pub fn decorator(mut self, decorator: EndpointDecorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Appends several decorators.
    pub fn decorators(mut self, decorators: impl IntoIterator<Item = EndpointDecorator>) -> Self {
        self.decorators.extend(decorators);
        self
    }

    /// Appends a step that runs before the handler.
    pub fn before(self, step: impl Handler) -> Self {
        self.decorator(EndpointDecorator::before(step))
    }

    /// Appends a step that runs after the handler.
    pub fn after(self, step: impl Handler) -> Self {
        self.decorator(EndpointDecorator::after(step))
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the URI pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the number of decorators.
    #[must_use]
    pub fn decorator_count(&self) -> usize {
        self.decorators.len()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("decorators", &self.decorators.len())
            .finish_non_exhaustive()
    }
}
