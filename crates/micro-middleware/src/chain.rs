//! Decorator composition.

use crate::decorator::{DecoratorPhase, EndpointDecorator};
use micro_core::{BoxFuture, BoxedHandler, Handler, Request, ResponseWriter};
use std::sync::Arc;

/// A base handler wrapped with ordered Before and After steps.
///
/// Each call to [`decorate`](Self::decorate) wraps the previous composite
/// with one more decorator. A Before step joins the end of the Before list
/// and an After step joins the end of the After list, so adding decorators
/// one at a time and adding the whole list at once serve requests
/// identically:
///
/// ```text
/// B1 -> B2 -> ... -> base -> A1 -> A2 -> ...
/// ```
pub struct DecoratorChain {
    base: BoxedHandler,
    before: Vec<BoxedHandler>,
    after: Vec<BoxedHandler>,
}

impl DecoratorChain {
    /// Starts a chain around `base`.
    pub fn new(base: BoxedHandler) -> Self {
        Self {
            base,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Wraps the chain with one more decorator.
    pub fn decorate(mut self, decorator: EndpointDecorator) -> Self {
        match decorator.phase() {
            DecoratorPhase::Before => self.before.push(decorator.into_step()),
            DecoratorPhase::After => self.after.push(decorator.into_step()),
        }
        self
    }

    /// Wraps the chain with every decorator in order.
    pub fn decorate_all(self, decorators: impl IntoIterator<Item = EndpointDecorator>) -> Self {
        decorators.into_iter().fold(self, Self::decorate)
    }

    /// Number of decorators in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    /// Returns true if the chain has no decorators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freezes the chain. Without decorators the base handler is returned as is.
    pub fn into_handler(self) -> BoxedHandler {
        if self.is_empty() {
            self.base
        } else {
            Arc::new(self)
        }
    }
}

impl std::fmt::Debug for DecoratorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratorChain")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish_non_exhaustive()
    }
}

impl Handler for DecoratorChain {
    fn serve<'a>(
        &'a self,
        writer: &'a mut ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            for step in &self.before {
                step.serve(writer, request).await;
            }
            self.base.serve(writer, request).await;
            for step in &self.after {
                step.serve(writer, request).await;
            }
        })
    }
}

/// Composes `handler` with `decorators` into one handler.
pub fn decorate(
    handler: BoxedHandler,
    decorators: impl IntoIterator<Item = EndpointDecorator>,
) -> BoxedHandler {
    let chain = DecoratorChain::new(handler).decorate_all(decorators);
    tracing::trace!(
        before = chain.before.len(),
        after = chain.after.len(),
        "composed decorator chain"
    );
    chain.into_handler()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use micro_core::handler_fn;

    fn writes(text: &'static str) -> impl Handler {
        handler_fn(move |writer, _| {
            Box::pin(async move {
                writer.write(text);
            })
        })
    }

    async fn run(handler: &BoxedHandler) -> ResponseWriter {
        let mut writer = ResponseWriter::new();
        let mut request = http::Request::new(Bytes::new());
        handler.serve(&mut writer, &mut request).await;
        writer
    }

    #[tokio::test]
    async fn test_hello_world_chain() {
        let status = handler_fn(|writer, _| {
            Box::pin(async move {
                writer.write_header(StatusCode::OK);
                writer.write("!");
            })
        });
        let handler = decorate(
            Arc::new(writes("World")),
            [
                EndpointDecorator::before(writes("Hello ")),
                EndpointDecorator::after(status),
            ],
        );

        let writer = run(&handler).await;
        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert_eq!(writer.body(), b"Hello World!");
    }

    #[tokio::test]
    async fn test_interleaved_registration_keeps_phase_order() {
        let handler = decorate(
            Arc::new(writes("H")),
            [
                EndpointDecorator::after(writes("A1")),
                EndpointDecorator::before(writes("B1")),
                EndpointDecorator::after(writes("A2")),
                EndpointDecorator::before(writes("B2")),
            ],
        );

        assert_eq!(run(&handler).await.body(), b"B1B2HA1A2");
    }

    #[tokio::test]
    async fn test_one_at_a_time_matches_atomic() {
        let incremental = DecoratorChain::new(Arc::new(writes("H")))
            .decorate(EndpointDecorator::before(writes("B1")))
            .decorate(EndpointDecorator::after(writes("A1")))
            .decorate(EndpointDecorator::before(writes("B2")))
            .into_handler();
        let atomic = decorate(
            Arc::new(writes("H")),
            [
                EndpointDecorator::before(writes("B1")),
                EndpointDecorator::after(writes("A1")),
                EndpointDecorator::before(writes("B2")),
            ],
        );

        assert_eq!(run(&incremental).await.body(), run(&atomic).await.body());
    }

    #[tokio::test]
    async fn test_nested_chain() {
        let inner = decorate(
            Arc::new(writes("H")),
            [
                EndpointDecorator::before(writes("b")),
                EndpointDecorator::after(writes("a")),
            ],
        );
        let outer = decorate(
            inner,
            [
                EndpointDecorator::before(writes("B")),
                EndpointDecorator::after(writes("A")),
            ],
        );

        assert_eq!(run(&outer).await.body(), b"BbHaA");
    }

    #[test]
    fn test_empty_chain_returns_base() {
        let base: BoxedHandler = Arc::new(writes("H"));
        let handler = decorate(Arc::clone(&base), []);
        assert!(Arc::ptr_eq(&base, &handler));
    }
}
