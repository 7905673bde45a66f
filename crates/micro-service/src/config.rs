//! Service configuration.
//!
//! ```rust
//! use micro_service::{HookError, ServiceConfig};
//! use std::time::Duration;
//!
//! let config = ServiceConfig::builder()
//!     .hostname("127.0.0.1")
//!     .port(8080)
//!     .shutdown_timeout(Duration::from_secs(10))
//!     .handle_signals(true)
//!     .before_start(|| async { Ok(()) })
//!     .after_stop(|| async { Err(HookError::new("cleanup failed")) })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.server().bind_addr(), "127.0.0.1:8080");
//! assert!(config.handle_signals());
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use micro_server::{ServerConfig, ServerConfigBuilder, ShutdownSignal};
use micro_telemetry::TracingConfig;

use crate::error::ServiceError;
use crate::hooks::{HookPhase, HookResult, LifecycleHooks};

/// Everything a [`Service`](crate::Service) needs besides its endpoints.
#[derive(Debug, Default)]
pub struct ServiceConfig {
    server: ServerConfig,
    handle_signals: bool,
    cancellation: Option<ShutdownSignal>,
    tracing: Option<TracingConfig>,
    hooks: LifecycleHooks,
}

impl ServiceConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// Returns true if `start` should listen for OS termination signals.
    #[must_use]
    pub fn handle_signals(&self) -> bool {
        self.handle_signals
    }

    /// Returns the external cancellation signal, if any.
    #[must_use]
    pub fn cancellation(&self) -> Option<&ShutdownSignal> {
        self.cancellation.as_ref()
    }

    /// Returns the tracing configuration.
    ///
    /// A service moves it into its tracing state on `init`, so this is
    /// `None` on the value returned by [`Service::config`](crate::Service::config).
    #[must_use]
    pub fn tracing(&self) -> Option<&TracingConfig> {
        self.tracing.as_ref()
    }

    /// Returns the lifecycle hooks.
    #[must_use]
    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    pub(crate) fn take_tracing(&mut self) -> Option<TracingConfig> {
        self.tracing.take()
    }
}

/// Builder for [`ServiceConfig`].
///
/// Hook registrars append: calling `before_start` twice registers two hooks
/// that run in that order.
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    server: ServerConfigBuilder,
    handle_signals: bool,
    cancellation: Option<ShutdownSignal>,
    tracing: Option<TracingConfig>,
    hooks: LifecycleHooks,
}

impl ServiceConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hostname. Empty means `localhost`.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.server = self.server.hostname(hostname);
        self
    }

    /// Sets the port. Zero or negative selects an ephemeral port.
    pub fn port(mut self, port: i32) -> Self {
        self.server = self.server.port(port);
        self
    }

    /// Serves TLS with a PEM certificate chain and private key.
    pub fn tls(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.server = self.server.tls(cert, key);
        self
    }

    /// Sets the certificate path alone.
    pub fn certificate_path(mut self, cert: impl Into<PathBuf>) -> Self {
        self.server = self.server.certificate_path(cert);
        self
    }

    /// Sets the private key path alone.
    pub fn key_path(mut self, key: impl Into<PathBuf>) -> Self {
        self.server = self.server.key_path(key);
        self
    }

    /// Sets the graceful shutdown timeout. Zero means the 5 second default.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.server = self.server.shutdown_timeout(timeout);
        self
    }

    /// Sets the graceful shutdown timeout in seconds. Non-positive means the default.
    pub fn shutdown_timeout_secs(mut self, secs: i64) -> Self {
        self.server = self.server.shutdown_timeout_secs(secs);
        self
    }

    /// Stops the service on SIGTERM, SIGINT or SIGQUIT (Ctrl-C off Unix).
    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Stops the service once `signal` is triggered.
    pub fn cancellation(mut self, signal: ShutdownSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    /// Enables tracing for every endpoint registered after `init`.
    pub fn tracing(mut self, config: TracingConfig) -> Self {
        self.tracing = Some(config);
        self
    }

    /// Appends a hook that runs before the server is started.
    pub fn before_start<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::BeforeStart, None, hook)
    }

    /// Appends a hook that runs once the server is listening.
    pub fn after_start<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::AfterStart, None, hook)
    }

    /// Appends a hook that runs before the server stops accepting.
    pub fn before_stop<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::BeforeStop, None, hook)
    }

    /// Appends a hook that runs after the server has drained.
    pub fn after_stop<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::AfterStop, None, hook)
    }

    /// Like [`before_start`](Self::before_start) with a name used in logs and errors.
    pub fn before_start_named<F, Fut>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::BeforeStart, Some(name.into()), hook)
    }

    /// Like [`after_start`](Self::after_start) with a name.
    pub fn after_start_named<F, Fut>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::AfterStart, Some(name.into()), hook)
    }

    /// Like [`before_stop`](Self::before_stop) with a name.
    pub fn before_stop_named<F, Fut>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::BeforeStop, Some(name.into()), hook)
    }

    /// Like [`after_stop`](Self::after_stop) with a name.
    pub fn after_stop_named<F, Fut>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.hook(HookPhase::AfterStop, Some(name.into()), hook)
    }

    fn hook<F, Fut>(mut self, phase: HookPhase, name: Option<String>, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        match name {
            Some(name) => self.hooks.push_named(phase, name, hook),
            None => self.hooks.push(phase, hook),
        }
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Server`] wrapping
    /// [`ServerError::InvalidConfig`](micro_server::ServerError::InvalidConfig)
    /// for a half-configured TLS pair or an out-of-range port.
    pub fn build(self) -> Result<ServiceConfig, ServiceError> {
        Ok(ServiceConfig {
            server: self.server.build()?,
            handle_signals: self.handle_signals,
            cancellation: self.cancellation,
            tracing: self.tracing,
            hooks: self.hooks,
        })
    }
}
