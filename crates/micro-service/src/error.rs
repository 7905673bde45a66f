//! Service error types.

use micro_router::RouteError;
use micro_server::ServerError;
use micro_telemetry::TelemetryError;
use thiserror::Error;

use crate::hooks::{HookError, HookPhase};

/// Errors returned by [`Service`](crate::Service) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A lifecycle hook failed. Later hooks of the phase were skipped.
    #[error("{phase} hook '{hook}' failed: {source}")]
    Hook {
        /// Phase the hook belongs to.
        phase: HookPhase,
        /// Name of the failing hook.
        hook: String,
        /// The hook's error.
        #[source]
        source: HookError,
    },

    /// Binding, TLS, configuration or drain failure from the server runtime.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// An endpoint could not be registered.
    #[error("failed to register endpoint: {0}")]
    Route(#[from] RouteError),

    /// The tracer provider could not be built or configured.
    #[error("tracing configuration error: {0}")]
    Tracing(#[source] TelemetryError),

    /// The tracer provider did not flush in time.
    #[error("tracing shutdown failed: {0}")]
    TracingShutdown(#[source] TelemetryError),

    /// OS signal handlers could not be installed.
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    /// Endpoints were registered after the router was handed to the server.
    #[error("endpoints cannot be registered after the service has started")]
    RoutesFrozen,

    /// `start` or `init` was called on a service that already started.
    #[error("service has already been started")]
    AlreadyStarted,

    /// `stop` was called on a service that is not running.
    #[error("service is not running")]
    NotRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_error_display() {
        let err = ServiceError::Hook {
            phase: HookPhase::AfterStart,
            hook: "warmup".to_string(),
            source: HookError::new("cache unreachable"),
        };
        assert_eq!(
            err.to_string(),
            "after_start hook 'warmup' failed: cache unreachable"
        );
    }

    #[test]
    fn test_server_error_is_transparent() {
        let err = ServiceError::from(ServerError::NotRunning);
        assert_eq!(err.to_string(), "server is not running");
    }
}
