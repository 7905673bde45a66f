//! Recording span exporter for tests.

use futures_util::future::BoxFuture;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Keeps every exported span in memory.
///
/// Clones share the same buffer, so a test keeps one clone and hands the
/// other to a [`TracingConfig`](crate::TracingConfig). Shutting the exporter
/// down keeps the recorded spans.
#[derive(Clone, Debug, Default)]
pub struct RecordingExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
    shutdown: Arc<AtomicBool>,
}

impl RecordingExporter {
    /// Returns a snapshot of the spans exported so far.
    #[must_use]
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans.lock().clone()
    }

    /// Forgets recorded spans.
    pub fn reset(&self) {
        self.spans.lock().clear();
    }

    /// Returns true once the provider has shut the exporter down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl SpanExporter for RecordingExporter {
    fn export(&mut self, mut batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        self.spans.lock().append(&mut batch);
        Box::pin(async { Ok(()) })
    }

    fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
