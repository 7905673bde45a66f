//! Lazily built, explicitly owned tracer provider.

use crate::config::{SpanProcessing, TracingConfig};
use crate::error::TelemetryError;
use crate::TelemetryResult;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug)]
enum Slot {
    Disabled,
    Pending(TracingConfig),
    Ready(TracerProvider),
    ShutDown,
}

/// The tracer provider of one service.
///
/// Nothing is built until the first [`get_or_init`](Self::get_or_init):
/// a service without tracing never creates a provider, and a service with
/// tracing builds exactly one that every traced endpoint shares. The provider
/// is never installed as the process-wide default.
#[derive(Debug)]
pub struct TracingState {
    service_name: String,
    service_version: String,
    slot: Mutex<Slot>,
}

impl TracingState {
    /// Creates the state for a service. `None` disables tracing.
    pub fn new(
        service_name: impl Into<String>,
        service_version: impl Into<String>,
        config: Option<TracingConfig>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            slot: Mutex::new(config.map_or(Slot::Disabled, Slot::Pending)),
        }
    }

    /// Replaces the configuration. Has no effect once a provider exists.
    pub fn configure(&self, config: Option<TracingConfig>) -> bool {
        let mut slot = self.slot.lock();
        match *slot {
            Slot::Disabled | Slot::Pending(_) => {
                *slot = config.map_or(Slot::Disabled, Slot::Pending);
                true
            }
            Slot::Ready(_) | Slot::ShutDown => false,
        }
    }

    /// Returns true if a sampler and exporter were configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::Disabled)
    }

    /// Returns true once the provider has been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Ready(_))
    }

    /// Returns the provider, building it on first use.
    ///
    /// Returns `Ok(None)` when tracing is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::TracingInit`] if the service name is empty,
    /// if batch export is requested outside a Tokio runtime, or if the
    /// provider was already shut down.
    pub fn get_or_init(&self) -> TelemetryResult<Option<TracerProvider>> {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Disabled => return Ok(None),
            Slot::Ready(provider) => return Ok(Some(provider.clone())),
            Slot::ShutDown => {
                return Err(TelemetryError::TracingInit(
                    "tracer provider already shut down".to_string(),
                ))
            }
            Slot::Pending(config) => {
                if self.service_name.trim().is_empty() {
                    return Err(TelemetryError::TracingInit(
                        "service name must not be empty".to_string(),
                    ));
                }
                if config.processing() == SpanProcessing::Batch
                    && tokio::runtime::Handle::try_current().is_err()
                {
                    return Err(TelemetryError::TracingInit(
                        "batch span export requires a Tokio runtime".to_string(),
                    ));
                }
            }
        }

        let Slot::Pending(config) = std::mem::replace(&mut *slot, Slot::Disabled) else {
            return Ok(None);
        };
        let resource = Resource::new([
            KeyValue::new(
                opentelemetry_semantic_conventions::attribute::SERVICE_NAME,
                self.service_name.clone(),
            ),
            KeyValue::new(
                opentelemetry_semantic_conventions::attribute::SERVICE_VERSION,
                self.service_version.clone(),
            ),
        ]);
        let provider = config.into_provider(resource);
        tracing::debug!(service = %self.service_name, "Created tracer provider");
        *slot = Slot::Ready(provider.clone());
        Ok(Some(provider))
    }

    /// Flushes and shuts down the provider, waiting at most `deadline`.
    ///
    /// Only the first call after the provider was built does any work.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::TracingShutdown`] if the exporter fails or
    /// the deadline passes first.
    pub async fn shutdown(&self, deadline: Duration) -> TelemetryResult<()> {
        let provider = {
            let mut slot = self.slot.lock();
            match std::mem::replace(&mut *slot, Slot::ShutDown) {
                Slot::Ready(provider) => provider,
                other => {
                    *slot = other;
                    return Ok(());
                }
            }
        };

        // Span processors block while flushing.
        let flush = tokio::task::spawn_blocking(move || provider.shutdown());
        match tokio::time::timeout(deadline, flush).await {
            Ok(Ok(Ok(()))) => {
                tracing::debug!(service = %self.service_name, "Tracer provider shut down");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(TelemetryError::TracingShutdown(e.to_string())),
            Ok(Err(e)) => Err(TelemetryError::TracingShutdown(e.to_string())),
            Err(_) => Err(TelemetryError::TracingShutdown(format!(
                "flush did not finish within {deadline:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExporter;
    use opentelemetry_sdk::trace::Sampler;

    fn simple(exporter: &RecordingExporter) -> TracingConfig {
        TracingConfig::new(Sampler::AlwaysOn, exporter.clone())
            .with_processing(SpanProcessing::Simple)
    }

    #[test]
    fn test_disabled_never_builds() {
        let state = TracingState::new("svc", "1.0.0", None);
        assert!(!state.is_enabled());
        assert!(state.get_or_init().unwrap().is_none());
        assert!(!state.is_initialized());
    }

    #[test]
    fn test_builds_once() {
        let exporter = RecordingExporter::default();
        let state = TracingState::new("svc", "1.0.0", Some(simple(&exporter)));
        assert!(state.is_enabled());
        assert!(!state.is_initialized());

        assert!(state.get_or_init().unwrap().is_some());
        assert!(state.is_initialized());
        assert!(state.get_or_init().unwrap().is_some());
        assert!(!state.configure(None));
    }

    #[test]
    fn test_empty_service_name() {
        let exporter = RecordingExporter::default();
        let state = TracingState::new("  ", "1.0.0", Some(simple(&exporter)));

        assert!(matches!(
            state.get_or_init(),
            Err(TelemetryError::TracingInit(_))
        ));
        assert!(!state.is_initialized());
    }

    #[test]
    fn test_batch_requires_runtime() {
        let exporter = RecordingExporter::default();
        let config = TracingConfig::new(Sampler::AlwaysOn, exporter);
        let state = TracingState::new("svc", "1.0.0", Some(config));

        let err = state.get_or_init().unwrap_err();
        assert!(err.to_string().contains("Tokio runtime"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_flushes_once() {
        let exporter = RecordingExporter::default();
        let state = TracingState::new("svc", "1.0.0", Some(simple(&exporter)));
        state.get_or_init().unwrap();

        state.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(exporter.is_shutdown());

        // Second shutdown is a no-op, and the provider cannot come back.
        state.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(state.get_or_init().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_batch_spans_flushed_on_shutdown() {
        use opentelemetry::trace::{Tracer, TracerProvider as _};

        let exporter = RecordingExporter::default();
        let config = TracingConfig::new(Sampler::AlwaysOn, exporter.clone());
        let state = TracingState::new("svc", "1.0.0", Some(config));

        let provider = state.get_or_init().unwrap().unwrap();
        provider.tracer("svc").in_span("work", |_| {});
        drop(provider);

        state.shutdown(Duration::from_secs(5)).await.unwrap();
        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "work");
    }

    #[tokio::test]
    async fn test_shutdown_without_provider() {
        let state = TracingState::new("svc", "1.0.0", None);
        assert!(state.shutdown(Duration::from_millis(10)).await.is_ok());
    }
}
