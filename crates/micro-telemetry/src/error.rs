//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur during telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to build the tracer provider.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),

    /// The tracer provider did not flush and shut down cleanly.
    #[error("Failed to shut down tracing: {0}")]
    TracingShutdown(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid configuration.
    #[error("Invalid telemetry configuration: {0}")]
    InvalidConfig(String),
}
