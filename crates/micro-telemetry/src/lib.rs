//! Tracing and logging for micro services.
//!
//! - **Tracing**: [`Traced`] wraps an endpoint handler with an OpenTelemetry
//!   server span. The [`TracerProvider`](opentelemetry_sdk::trace::TracerProvider)
//!   comes from a [`TracingState`] owned by the service and passed in explicitly;
//!   nothing is registered globally, so several services can share a process.
//! - **Logging**: [`init_logging`] installs a `tracing-subscriber` stack with
//!   JSON or pretty output.
//!
//! # Architecture
//!
//! ```text
//! TracingConfig (sampler + exporter)
//!        │  first traced endpoint
//!        ▼
//! TracingState ──get_or_init──▶ TracerProvider ──▶ Traced(endpoint handler)
//!        │
//!        └── shutdown(deadline) on service stop: flush + close exporter
//! ```

#![doc(html_root_url = "https://docs.rs/micro-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
pub mod logging;
mod state;
mod traced;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{SpanProcessing, TracingConfig};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use state::TracingState;
pub use traced::{HeaderExtractor, Traced};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
