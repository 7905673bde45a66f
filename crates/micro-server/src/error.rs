//! Server error types.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`ServerRuntime`](crate::ServerRuntime) and its configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be created.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        /// Address that was requested.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key material is missing or unusable.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// The configuration is inconsistent.
    #[error("invalid server configuration: {0}")]
    InvalidConfig(String),

    /// `start` was called on a runtime that already started.
    #[error("server has already been started")]
    AlreadyStarted,

    /// `stop` was called on a runtime that is not running.
    #[error("server is not running")]
    NotRunning,

    /// Connections were still open when the shutdown timeout expired.
    /// They have been closed forcibly.
    #[error("graceful shutdown exceeded {timeout:?}; force-closed {remaining} connection(s)")]
    DrainTimeout {
        /// The configured shutdown timeout.
        timeout: Duration,
        /// Connections that had to be closed forcibly.
        remaining: usize,
    },

    /// The drain task went away without acknowledging the stop request.
    #[error("shutdown was not acknowledged by the server task")]
    DrainAborted,
}

impl ServerError {
    /// Returns true for errors produced by the graceful drain.
    #[must_use]
    pub fn is_drain_error(&self) -> bool {
        matches!(self, Self::DrainTimeout { .. } | Self::DrainAborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ServerError::Bind {
            address: "localhost:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(
            err.to_string(),
            "failed to bind to localhost:80: address in use"
        );
    }

    #[test]
    fn test_drain_error_classification() {
        let err = ServerError::DrainTimeout {
            timeout: Duration::from_secs(1),
            remaining: 2,
        };
        assert!(err.is_drain_error());
        assert!(err.to_string().contains("2 connection(s)"));
        assert!(!ServerError::NotRunning.is_drain_error());
    }
}
