//! Tracing configuration: a sampler and an exporter.

use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, TracerProvider};
use opentelemetry_sdk::Resource;
use std::fmt;

/// How finished spans reach the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanProcessing {
    /// Spans are queued and exported in batches on the Tokio runtime.
    #[default]
    Batch,
    /// Every span is exported synchronously as it ends.
    Simple,
}

type InstallFn = Box<dyn FnOnce(Sampler, Resource, SpanProcessing) -> TracerProvider + Send + Sync>;

/// Sampler and exporter pair that enables tracing for a service.
///
/// The exporter is captured here and moved into the tracer provider the
/// first time the provider is built.
///
/// ```rust,ignore
/// use micro_telemetry::{SpanProcessing, TracingConfig};
/// use opentelemetry_sdk::trace::Sampler;
///
/// let tracing = TracingConfig::new(Sampler::AlwaysOn, exporter)
///     .with_processing(SpanProcessing::Simple);
/// ```
pub struct TracingConfig {
    sampler: Sampler,
    processing: SpanProcessing,
    install: InstallFn,
}

impl TracingConfig {
    /// Creates a configuration exporting through `exporter`.
    pub fn new<E>(sampler: Sampler, exporter: E) -> Self
    where
        E: SpanExporter + Sync + 'static,
    {
        Self {
            sampler,
            processing: SpanProcessing::default(),
            install: Box::new(move |sampler, resource, processing| {
                let builder = TracerProvider::builder()
                    .with_sampler(sampler)
                    .with_id_generator(RandomIdGenerator::default())
                    .with_resource(resource);
                match processing {
                    SpanProcessing::Batch => builder
                        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
                        .build(),
                    SpanProcessing::Simple => builder.with_simple_exporter(exporter).build(),
                }
            }),
        }
    }

    /// Selects batch or simple span processing.
    #[must_use]
    pub fn with_processing(mut self, processing: SpanProcessing) -> Self {
        self.processing = processing;
        self
    }

    /// Returns the span processing mode.
    #[must_use]
    pub fn processing(&self) -> SpanProcessing {
        self.processing
    }

    /// Returns the sampler.
    #[must_use]
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub(crate) fn into_provider(self, resource: Resource) -> TracerProvider {
        (self.install)(self.sampler, resource, self.processing)
    }
}

impl fmt::Debug for TracingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingConfig")
            .field("sampler", &self.sampler)
            .field("processing", &self.processing)
            .finish_non_exhaustive()
    }
}
