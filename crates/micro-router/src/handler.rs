//! Router that dispatches requests to handlers.

use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode};
use micro_core::{BoxFuture, BoxedHandler, Handler, Request, ResponseWriter};
use std::sync::Arc;

use crate::error::RouteError;
use crate::router::Router;

/// Registration side of a routing capability.
///
/// A service registers every endpoint through this trait and, once all
/// endpoints are known, freezes the registry into the top-level handler
/// handed to the server.
pub trait RouteRegistry: Send + 'static {
    /// Registers `handler` for `method` at `pattern`.
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(), RouteError>;

    /// Freezes the registry into a request handler.
    fn into_handler(self: Box<Self>) -> BoxedHandler;
}

/// The default [`RouteRegistry`]: a radix tree of handlers.
///
/// Unknown paths get `404 page not found`. Known paths with an unregistered
/// method get `405` and an `Allow` header.
#[derive(Default)]
pub struct HandlerRouter {
    routes: Router<BoxedHandler>,
}

impl std::fmt::Debug for HandlerRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRouter")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl HandlerRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, taking it by value.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<(), RouteError> {
        self.register(method, pattern, Arc::new(handler))
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteRegistry for HandlerRouter {
    fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(), RouteError> {
        tracing::trace!(method = %method, pattern, "registering route");
        self.routes.route(method, pattern, handler)
    }

    fn into_handler(self: Box<Self>) -> BoxedHandler {
        Arc::new(*self)
    }
}

impl Handler for HandlerRouter {
    fn serve<'a>(
        &'a self,
        writer: &'a mut ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some((methods, params)) = self.routes.match_path(request.uri().path()) else {
                not_found(writer);
                return;
            };
            match methods.get(request.method()) {
                Some(handler) => {
                    request.extensions_mut().insert(params);
                    handler.serve(writer, request).await;
                }
                None => method_not_allowed(writer, &methods.allowed()),
            }
        })
    }
}

fn not_found(writer: &mut ResponseWriter) {
    writer
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    writer.write_header(StatusCode::NOT_FOUND);
    writer.write("404 page not found\n");
}

fn method_not_allowed(writer: &mut ResponseWriter, allowed: &[Method]) {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        writer.headers_mut().insert(ALLOW, value);
    }
    writer.write_header(StatusCode::METHOD_NOT_ALLOWED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;
    use bytes::Bytes;
    use micro_core::handler_fn;

    fn echo_param() -> impl Handler {
        handler_fn(|writer, request| {
            Box::pin(async move {
                let id = request
                    .extensions()
                    .get::<Params>()
                    .and_then(|p| p.get("id"))
                    .unwrap_or("none")
                    .to_string();
                writer.write(id);
            })
        })
    }

    async fn dispatch(router: &HandlerRouter, method: Method, uri: &str) -> ResponseWriter {
        let mut writer = ResponseWriter::new();
        let mut request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap();
        router.serve(&mut writer, &mut request).await;
        writer
    }

    #[tokio::test]
    async fn test_dispatch_inserts_params() {
        let mut router = HandlerRouter::new();
        router.route(Method::GET, "/users/{id}", echo_param()).unwrap();

        let writer = dispatch(&router, Method::GET, "/users/42?verbose=1").await;
        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert_eq!(writer.body(), b"42");
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let router = HandlerRouter::new();

        let writer = dispatch(&router, Method::GET, "/missing").await;
        assert_eq!(writer.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(writer.body(), b"404 page not found\n");
    }

    #[tokio::test]
    async fn test_dispatch_method_not_allowed() {
        let mut router = HandlerRouter::new();
        router.route(Method::GET, "/users/{id}", echo_param()).unwrap();
        router.route(Method::DELETE, "/users/{id}", echo_param()).unwrap();

        let writer = dispatch(&router, Method::POST, "/users/1").await;
        assert_eq!(writer.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
        assert_eq!(writer.headers()[ALLOW], "GET, DELETE");
    }

    #[tokio::test]
    async fn test_into_handler_serves_routes() {
        let mut registry: Box<dyn RouteRegistry> = Box::new(HandlerRouter::new());
        registry
            .register(Method::GET, "/users/{id}", Arc::new(echo_param()))
            .unwrap();

        let handler = registry.into_handler();
        let mut writer = ResponseWriter::new();
        let mut request = http::Request::get("/users/7").body(Bytes::new()).unwrap();
        handler.serve(&mut writer, &mut request).await;

        assert_eq!(writer.body(), b"7");
    }

    #[test]
    fn test_register_rejects_bad_pattern() {
        let mut router = HandlerRouter::new();
        let err = router.route(Method::GET, "users", echo_param()).unwrap_err();
        assert!(matches!(err, RouteError::MissingLeadingSlash { .. }));
        assert!(router.is_empty());
    }
}
