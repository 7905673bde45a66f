//! The service orchestrator.
//!
//! # Lifecycle
//!
//! ```text
//! Configured ──start──▶ Starting ──▶ Running ──stop──▶ Stopping ──▶ Stopped
//!     ▲                    │                              │
//!     └── hook/bind error ─┘          before_stop error ──┘ (back to Running)
//! ```
//!
//! `start` runs the before-start hooks, freezes the router, starts a fresh
//! [`ServerRuntime`], runs the after-start hooks and spawns a watcher that
//! calls `stop` on an OS signal or on the configured cancellation signal.
//! `stop` runs the before-stop hooks, drains the server, runs the after-stop
//! hooks and flushes the tracer provider.

use std::sync::{Arc, Weak};

use micro_core::BoxedHandler;
use micro_middleware::decorate;
use micro_router::{HandlerRouter, RouteRegistry};
use micro_server::{ServerRuntime, ShutdownSignal};
use micro_telemetry::{TelemetryError, Traced, TracingState};
use parking_lot::{Mutex, RwLock};

use crate::config::ServiceConfig;
use crate::endpoint::Endpoint;
use crate::error::ServiceError;
use crate::hooks::HookPhase;
use crate::signals::OsSignals;

/// Where a service is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Accepting configuration and endpoints.
    Configured,
    /// `start` is in progress.
    Starting,
    /// The server is listening.
    Running,
    /// `stop` is in progress.
    Stopping,
    /// Terminal.
    Stopped,
}

enum Routes {
    Open(Box<dyn RouteRegistry>),
    Frozen(BoxedHandler),
}

struct Inner {
    name: String,
    version: String,
    state: Mutex<ServiceState>,
    config: RwLock<Arc<ServiceConfig>>,
    routes: Mutex<Routes>,
    tracing: TracingState,
    server: RwLock<Option<Arc<ServerRuntime>>>,
    watcher: Mutex<Option<ShutdownSignal>>,
}

/// A managed HTTP(S) service.
///
/// `Service` is a cheap handle: clones share the same service, so one clone
/// can be moved into a task that calls [`stop`](Self::stop) while another
/// awaits something else.
///
/// # Example
///
/// ```rust,no_run
/// use micro_core::handler_fn;
/// use micro_service::{Endpoint, Service, ServiceConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), micro_service::ServiceError> {
///     let service = Service::new("greeter", "1.0.0");
///     service.init(ServiceConfig::builder().port(8080).handle_signals(true).build()?)?;
///     service.endpoints([Endpoint::get("hello", "/", handler_fn(|w, _r| {
///         Box::pin(async move {
///             w.write("Hello World!");
///         })
///     }))])?;
///
///     service.start().await?;
///     // ... SIGTERM or Ctrl-C stops the service
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

impl Service {
    /// Creates a service routing with the built-in [`HandlerRouter`].
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_router(name, version, HandlerRouter::new())
    }

    /// Creates a service registering endpoints on `router`.
    pub fn with_router(
        name: impl Into<String>,
        version: impl Into<String>,
        router: impl RouteRegistry,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            inner: Arc::new(Inner {
                tracing: TracingState::new(name.clone(), version.clone(), None),
                name,
                version,
                state: Mutex::new(ServiceState::Configured),
                config: RwLock::new(Arc::new(ServiceConfig::default())),
                routes: Mutex::new(Routes::Open(Box::new(router))),
                server: RwLock::new(None),
                watcher: Mutex::new(None),
            }),
        }
    }

    /// Replaces the configuration.
    ///
    /// Call it before [`endpoints`](Self::endpoints) when enabling tracing:
    /// endpoints are wrapped at registration time.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::AlreadyStarted`] once `start` has been called
    /// - [`ServiceError::Tracing`] if traced endpoints already exist
    pub fn init(&self, mut config: ServiceConfig) -> Result<(), ServiceError> {
        let state = self.inner.state.lock();
        if *state != ServiceState::Configured {
            return Err(ServiceError::AlreadyStarted);
        }
        if !self.inner.tracing.configure(config.take_tracing()) {
            return Err(ServiceError::Tracing(TelemetryError::InvalidConfig(
                "tracer provider already built; call init before registering endpoints"
                    .to_string(),
            )));
        }
        *self.inner.config.write() = Arc::new(config);
        tracing::debug!(service = %self.inner.name, "Service configured");
        Ok(())
    }

    /// Composes and registers endpoints.
    ///
    /// Each handler is wrapped with its decorators and, when tracing is
    /// configured, with a server span named after the endpoint. The tracer
    /// provider is built on the first traced endpoint.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::RoutesFrozen`] once the service has started
    /// - [`ServiceError::Tracing`] if the tracer provider cannot be built
    /// - [`ServiceError::Route`] for an invalid or duplicate route
    pub fn endpoints(
        &self,
        endpoints: impl IntoIterator<Item = Endpoint>,
    ) -> Result<(), ServiceError> {
        let mut routes = self.inner.routes.lock();
        let Routes::Open(registry) = &mut *routes else {
            return Err(ServiceError::RoutesFrozen);
        };

        for endpoint in endpoints {
            let Endpoint {
                name,
                method,
                pattern,
                handler,
                decorators,
            } = endpoint;

            let mut composed = decorate(handler, decorators);
            if let Some(provider) = self
                .inner
                .tracing
                .get_or_init()
                .map_err(ServiceError::Tracing)?
            {
                composed = Arc::new(Traced::new(composed, &provider, &self.inner.name, &name));
            }

            registry.register(method.clone(), &pattern, composed)?;
            tracing::debug!(
                service = %self.inner.name,
                endpoint = %name,
                %method,
                %pattern,
                "Registered endpoint"
            );
        }
        Ok(())
    }

    /// Starts the service, handling OS signals if the configuration asks for it.
    pub async fn start(&self) -> Result<(), ServiceError> {
        let handle_signals = self.config().handle_signals();
        self.start_with_signals(handle_signals).await
    }

    /// Starts the service.
    ///
    /// Returns once the listener is bound and the after-start hooks ran.
    /// When `handle_signals` is set, SIGTERM, SIGINT and SIGQUIT stop the
    /// service.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::AlreadyStarted`] unless the service is configured
    /// - [`ServiceError::Hook`] from a before-start hook; nothing was started
    /// - [`ServiceError::Server`] if binding fails; the service can be started again
    /// - [`ServiceError::Hook`] from an after-start hook; the server keeps running
    /// - [`ServiceError::Signals`] if handlers cannot be installed; the server keeps running
    pub async fn start_with_signals(&self, handle_signals: bool) -> Result<(), ServiceError> {
        if !self
            .inner
            .transition(ServiceState::Configured, ServiceState::Starting)
        {
            return Err(ServiceError::AlreadyStarted);
        }

        let config = self.config();
        if let Err(e) = config.hooks().run(HookPhase::BeforeStart).await {
            self.inner.set_state(ServiceState::Configured);
            return Err(e);
        }

        let server = Arc::new(ServerRuntime::new(
            config.server().clone(),
            self.inner.freeze_routes(),
        ));
        if let Err(e) = server.start().await {
            self.inner.set_state(ServiceState::Configured);
            return Err(e.into());
        }
        *self.inner.server.write() = Some(Arc::clone(&server));

        let stop_watcher = ShutdownSignal::new();
        *self.inner.watcher.lock() = Some(stop_watcher.clone());
        self.inner.set_state(ServiceState::Running);
        tracing::info!(
            service = %self.inner.name,
            version = %self.inner.version,
            address = %server,
            "Service started"
        );

        config.hooks().run(HookPhase::AfterStart).await?;

        let os_signals = if handle_signals {
            Some(OsSignals::register().map_err(ServiceError::Signals)?)
        } else {
            None
        };
        tokio::spawn(watch(
            Arc::downgrade(&self.inner),
            stop_watcher,
            config.cancellation().cloned(),
            os_signals,
        ));
        Ok(())
    }

    /// Stops the service.
    ///
    /// Only one caller performs the stop sequence; the watcher and explicit
    /// callers race safely.
    ///
    /// The tracer-provider flush is bounded by the server shutdown timeout,
    /// not by the cancellation signal: that signal has usually fired already
    /// when a cancelled service stops, so it cannot carry a flush deadline.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotRunning`] unless the service is running
    /// - [`ServiceError::Hook`] from a before-stop hook; the service keeps running
    /// - [`ServiceError::Server`] if the drain timed out
    /// - [`ServiceError::Hook`] from an after-stop hook
    /// - [`ServiceError::TracingShutdown`] if spans could not be flushed in time
    pub async fn stop(&self) -> Result<(), ServiceError> {
        if !self
            .inner
            .transition(ServiceState::Running, ServiceState::Stopping)
        {
            return Err(ServiceError::NotRunning);
        }
        tracing::info!(service = %self.inner.name, "Stopping service");

        let config = self.config();
        if let Err(e) = config.hooks().run(HookPhase::BeforeStop).await {
            self.inner.set_state(ServiceState::Running);
            return Err(e);
        }
        if let Some(watcher) = self.inner.watcher.lock().take() {
            watcher.trigger();
        }

        let result = self.finish_stop(&config).await;
        self.inner.set_state(ServiceState::Stopped);
        match &result {
            Ok(()) => tracing::info!(service = %self.inner.name, "Service stopped"),
            Err(e) => tracing::warn!(service = %self.inner.name, error = %e, "Service stopped with error"),
        }
        result
    }

    async fn finish_stop(&self, config: &ServiceConfig) -> Result<(), ServiceError> {
        let server = self.inner.server.read().clone();
        if let Some(server) = server {
            server.stop().await?;
        }

        config.hooks().run(HookPhase::AfterStop).await?;

        self.inner
            .tracing
            .shutdown(config.server().shutdown_timeout())
            .await
            .map_err(ServiceError::TracingShutdown)
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        *self.inner.state.lock()
    }

    /// Returns the current configuration. Its tracing part lives in the
    /// service's tracing state and reads as `None` here.
    #[must_use]
    pub fn config(&self) -> Arc<ServiceConfig> {
        Arc::clone(&self.inner.config.read())
    }

    /// Returns the server runtime of the current or last run.
    #[must_use]
    pub fn server(&self) -> Option<Arc<ServerRuntime>> {
        self.inner.server.read().clone()
    }

    /// Returns the bound address once started, the configured one before.
    #[must_use]
    pub fn address(&self) -> String {
        match self.server() {
            Some(server) => server.address(),
            None => self.config().server().bind_addr(),
        }
    }

    /// Returns true once a tracer provider has been built.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.inner.tracing.is_initialized()
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.inner.name)
            .field("version", &self.inner.version)
            .field("state", &self.state())
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn transition(&self, from: ServiceState, to: ServiceState) -> bool {
        let mut state = self.state.lock();
        if *state == from {
            *state = to;
            true
        } else {
            false
        }
    }

    fn set_state(&self, state: ServiceState) {
        *self.state.lock() = state;
    }

    /// Hands the registry over as the server's handler. Later calls reuse it.
    fn freeze_routes(&self) -> BoxedHandler {
        let mut routes = self.routes.lock();
        let handler = match &mut *routes {
            Routes::Frozen(handler) => return Arc::clone(handler),
            Routes::Open(registry) => {
                std::mem::replace(registry, Box::new(HandlerRouter::new())).into_handler()
            }
        };
        *routes = Routes::Frozen(Arc::clone(&handler));
        handler
    }
}

impl Drop for Inner {
    /// Ends the watcher when the last handle goes away without `stop`.
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.get_mut().take() {
            watcher.trigger();
        }
    }
}

/// Stops the service on the first external trigger.
///
/// Ends without stopping when `stopped` fires, which `stop` does for
/// explicit calls.
async fn watch(
    inner: Weak<Inner>,
    stopped: ShutdownSignal,
    cancellation: Option<ShutdownSignal>,
    os_signals: Option<OsSignals>,
) {
    let cancelled = async move {
        match cancellation {
            Some(signal) => signal.recv().await,
            None => std::future::pending().await,
        }
    };
    let signalled = async move {
        match os_signals {
            Some(mut signals) => signals.recv().await,
            None => std::future::pending().await,
        }
    };

    let reason = tokio::select! {
        () = stopped.recv() => return,
        () = cancelled => "cancellation",
        signal = signalled => signal,
    };

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let service = Service { inner };
    tracing::info!(service = %service.name(), reason, "Shutdown requested");
    if let Err(e) = service.stop().await {
        tracing::error!(service = %service.name(), error = %e, "Service stop failed");
    }
}
