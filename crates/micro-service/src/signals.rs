//! OS termination signals.

use std::io;

/// Signal handlers registered for one running service.
///
/// SIGKILL cannot be caught, so only the catchable termination signals are
/// watched.
#[derive(Debug)]
pub(crate) struct OsSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    quit: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Installs the handlers. Must be called inside a Tokio runtime.
    #[cfg(unix)]
    pub(crate) fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    #[cfg(not(unix))]
    pub(crate) fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Waits for the first signal and returns its name.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }

    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handler failed");
                std::future::pending().await
            }
        }
    }
}
