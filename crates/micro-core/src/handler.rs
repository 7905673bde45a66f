//! The request handling capability.
//!
//! Everything that serves a request implements [`Handler`]: endpoint
//! functions, decorators, the tracing wrapper and the router itself.

use crate::{Request, ResponseWriter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that is `Send` and has a lifetime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Handles one request by writing into a [`ResponseWriter`].
///
/// The request is mutable so wrappers can attach extensions (path
/// parameters, trace context) before delegating.
///
/// # Example
///
/// ```
/// use micro_core::{BoxFuture, Handler, Request, ResponseWriter};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn serve<'a>(
///         &'a self,
///         writer: &'a mut ResponseWriter,
///         _request: &'a mut Request,
///     ) -> BoxFuture<'a, ()> {
///         Box::pin(async move {
///             writer.write("Hello World!");
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Serves a single request.
    fn serve<'a>(
        &'a self,
        writer: &'a mut ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve<'a>(
        &'a self,
        writer: &'a mut ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        (**self).serve(writer, request)
    }
}

/// Handler backed by a closure. Created with [`handler_fn`].
pub struct HandlerFn<F> {
    func: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Turns a closure returning a boxed future into a [`Handler`].
///
/// ```
/// use micro_core::handler_fn;
///
/// let hello = handler_fn(|writer, _request| {
///     Box::pin(async move {
///         writer.write("Hello World!");
///     })
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(func: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut ResponseWriter, &'a mut Request) -> BoxFuture<'a, ()>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { func }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut ResponseWriter, &'a mut Request) -> BoxFuture<'a, ()>
        + Send
        + Sync
        + 'static,
{
    fn serve<'a>(
        &'a self,
        writer: &'a mut ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        (self.func)(writer, request)
    }
}
