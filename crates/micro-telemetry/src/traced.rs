//! Span-per-request handler wrapper.

use micro_core::{BoxFuture, BoxedHandler, ConnectionInfo, Handler, Request, ResponseWriter};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use std::borrow::Cow;

/// Wraps a handler so every request runs inside a server span.
///
/// The span is named after the endpoint and created by a tracer named after
/// the service. Its parent is the [`Context`] found in the request extensions,
/// or the W3C `traceparent` headers when there is none. While the inner
/// handler runs, the span-carrying context replaces the request's
/// [`Context`] extension. The previous value is restored afterwards.
///
/// Tracing only observes: status, headers and body are left untouched.
pub struct Traced {
    inner: BoxedHandler,
    tracer: opentelemetry_sdk::trace::Tracer,
    span_name: Cow<'static, str>,
    propagator: TraceContextPropagator,
}

impl Traced {
    /// Wraps `inner` with spans from `provider`.
    pub fn new(
        inner: BoxedHandler,
        provider: &TracerProvider,
        service_name: impl Into<String>,
        endpoint_name: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            tracer: provider.tracer(service_name.into()),
            span_name: Cow::Owned(endpoint_name.into()),
            propagator: TraceContextPropagator::new(),
        }
    }

    fn parent_context(&self, request: &Request) -> Context {
        request
            .extensions()
            .get::<Context>()
            .cloned()
            .unwrap_or_else(|| self.propagator.extract(&HeaderExtractor(request.headers())))
    }
}

impl std::fmt::Debug for Traced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traced")
            .field("span_name", &self.span_name)
            .finish_non_exhaustive()
    }
}

impl Handler for Traced {
    fn serve<'a>(
        &'a self,
        writer: &'a mut ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let parent = self.parent_context(request);
            let span = self
                .tracer
                .span_builder(self.span_name.clone())
                .with_kind(SpanKind::Server)
                .with_attributes(request_attributes(request))
                .start_with_context(&self.tracer, &parent);
            let cx = parent.with_span(span);
            let _guard = EndSpanOnDrop(cx.clone());

            let previous = request.extensions_mut().insert(cx.clone());
            self.inner.serve(writer, request).await;
            match previous {
                Some(previous) => {
                    request.extensions_mut().insert(previous);
                }
                None => {
                    request.extensions_mut().remove::<Context>();
                }
            }

            if let Some(status) = writer.status() {
                cx.span().set_attribute(KeyValue::new(
                    "http.status_code",
                    i64::from(status.as_u16()),
                ));
            }
        })
    }
}

/// Ends the span when dropped, including while unwinding.
struct EndSpanOnDrop(Context);

impl Drop for EndSpanOnDrop {
    fn drop(&mut self) {
        self.0.span().end();
    }
}

/// Standard HTTP attributes recorded when the span starts.
fn request_attributes(request: &Request) -> Vec<KeyValue> {
    let uri = request.uri();
    let scheme = uri
        .scheme_str()
        .or_else(|| request.extensions().get::<ConnectionInfo>().map(ConnectionInfo::scheme))
        .unwrap_or("http")
        .to_string();
    let host = uri
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            request
                .headers()
                .get(http::header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();
    let target = uri
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());
    let url = format!("{scheme}://{host}{target}");

    vec![
        KeyValue::new("http.method", request.method().as_str().to_string()),
        KeyValue::new("http.url", url),
        KeyValue::new("http.target", target),
        KeyValue::new("http.host", host),
        KeyValue::new("http.scheme", scheme),
    ]
}

/// Reads propagation headers from an `http::HeaderMap`.
pub struct HeaderExtractor<'a>(pub &'a http::HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(http::HeaderName::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExporter;
    use bytes::Bytes;
    use http::StatusCode;
    use micro_core::handler_fn;
    use opentelemetry::trace::{SpanId, TraceId};
    use opentelemetry::Value;
    use opentelemetry_sdk::trace::Sampler;
    use std::sync::Arc;

    fn provider(exporter: &RecordingExporter) -> TracerProvider {
        TracerProvider::builder()
            .with_sampler(Sampler::AlwaysOn)
            .with_simple_exporter(exporter.clone())
            .build()
    }

    fn created() -> BoxedHandler {
        Arc::new(handler_fn(|writer, _| {
            Box::pin(async move {
                writer.write_header(StatusCode::CREATED);
                writer.write("made");
            })
        }))
    }

    fn attribute(span: &opentelemetry_sdk::export::trace::SpanData, key: &str) -> Option<Value> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.clone())
    }

    #[test]
    fn test_header_extractor() {
        let mut headers = http::HeaderMap::new();
        headers.insert("traceparent", "test-value".parse().unwrap());

        let extractor = HeaderExtractor(&headers);
        assert_eq!(extractor.get("traceparent"), Some("test-value"));
        assert!(extractor.get("nonexistent").is_none());
        assert_eq!(extractor.keys(), vec!["traceparent"]);
    }

    #[tokio::test]
    async fn test_traced_records_span_and_preserves_response() {
        let exporter = RecordingExporter::default();
        let provider = provider(&exporter);
        let traced = Traced::new(created(), &provider, "greeter", "create");

        let mut writer = ResponseWriter::new();
        let mut request = http::Request::post("/items?id=1")
            .header(http::header::HOST, "example.test:8080")
            .body(Bytes::new())
            .unwrap();
        traced.serve(&mut writer, &mut request).await;

        assert_eq!(writer.status(), Some(StatusCode::CREATED));
        assert_eq!(writer.body(), b"made");
        assert!(request.extensions().get::<Context>().is_none());

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.name, "create");
        assert_eq!(span.span_kind, SpanKind::Server);
        assert_eq!(attribute(span, "http.method"), Some(Value::from("POST")));
        assert_eq!(
            attribute(span, "http.url"),
            Some(Value::from("http://example.test:8080/items?id=1"))
        );
        assert_eq!(attribute(span, "http.target"), Some(Value::from("/items?id=1")));
        assert_eq!(attribute(span, "http.host"), Some(Value::from("example.test:8080")));
        assert_eq!(attribute(span, "http.scheme"), Some(Value::from("http")));
        assert_eq!(attribute(span, "http.status_code"), Some(Value::I64(201)));
    }

    #[tokio::test]
    async fn test_traced_continues_remote_parent() {
        let exporter = RecordingExporter::default();
        let provider = provider(&exporter);
        let traced = Traced::new(created(), &provider, "greeter", "create");

        let mut writer = ResponseWriter::new();
        let mut request = http::Request::get("/")
            .header(
                "traceparent",
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            )
            .body(Bytes::new())
            .unwrap();
        traced.serve(&mut writer, &mut request).await;

        let spans = exporter.finished_spans();
        assert_eq!(
            spans[0].span_context.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
        assert_eq!(
            spans[0].parent_span_id,
            SpanId::from_hex("00f067aa0ba902b7").unwrap()
        );
    }

    #[tokio::test]
    async fn test_inner_handler_sees_span_context() {
        let exporter = RecordingExporter::default();
        let provider = provider(&exporter);
        let inner: BoxedHandler = Arc::new(handler_fn(|writer, request| {
            Box::pin(async move {
                let valid = request
                    .extensions()
                    .get::<Context>()
                    .is_some_and(|cx| cx.span().span_context().is_valid());
                writer.write(if valid { "traced" } else { "untraced" });
            })
        }));
        let traced = Traced::new(inner, &provider, "greeter", "probe");

        let mut writer = ResponseWriter::new();
        let mut request = http::Request::new(Bytes::new());
        traced.serve(&mut writer, &mut request).await;

        assert_eq!(writer.body(), b"traced");
    }

    #[tokio::test]
    async fn test_span_ends_when_handler_panics() {
        use futures_util::FutureExt;

        let exporter = RecordingExporter::default();
        let provider = provider(&exporter);
        let inner: BoxedHandler =
            Arc::new(handler_fn(|_, _| Box::pin(async { panic!("handler failure") })));
        let traced = Traced::new(inner, &provider, "greeter", "explode");

        let mut writer = ResponseWriter::new();
        let mut request = http::Request::new(Bytes::new());
        let outcome = std::panic::AssertUnwindSafe(traced.serve(&mut writer, &mut request))
            .catch_unwind()
            .await;

        assert!(outcome.is_err());
        assert_eq!(exporter.finished_spans().len(), 1);
    }
}
