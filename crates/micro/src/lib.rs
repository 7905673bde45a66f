//! # Micro
//!
//! **A runtime shell for HTTP(S) services**
//!
//! - **Lifecycle** – bind, serve in the background, drain within a deadline on stop
//! - **Hooks** – before/after start and stop, fail-fast
//! - **Decorators** – ordered before/after steps around each endpoint
//! - **Tracing** – optional OpenTelemetry server spans, provider owned per service
//! - **Signals** – stop on SIGTERM/SIGINT/SIGQUIT or a cancellation signal
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use micro::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::development())?;
//!
//!     let service = Service::new("greeter", "1.0.0");
//!     service.init(ServiceConfig::builder().port(8080).handle_signals(true).build()?)?;
//!     service.endpoints([
//!         Endpoint::get("hello", "/hello/{name}", handler_fn(|w, r| {
//!             Box::pin(async move {
//!                 let name = r
//!                     .extensions()
//!                     .get::<Params>()
//!                     .and_then(|p| p.get("name"))
//!                     .unwrap_or("world")
//!                     .to_string();
//!                 w.write(format!("Hello {name}!"));
//!             })
//!         })),
//!     ])?;
//!
//!     service.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     service.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Service ── endpoints ──▶ decorate ──▶ Traced ──▶ RouteRegistry
//!    │
//!    └── start ──▶ ServerRuntime(router) ──▶ accept loop ──▶ connection tasks
//!    └── stop  ──▶ hooks ──▶ drain ──▶ hooks ──▶ tracer flush
//! ```

#![doc(html_root_url = "https://docs.rs/micro/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use micro_core as core;

// Re-export routing
pub use micro_router as router;

// Re-export decorators
pub use micro_middleware as middleware;

// Re-export telemetry
pub use micro_telemetry as telemetry;

// Re-export the server runtime
pub use micro_server as server;

// Re-export the orchestrator
pub use micro_service as service;

/// Prelude module for convenient imports.
///
/// ```rust
/// use micro::prelude::*;
/// ```
pub mod prelude {
    pub use micro_core::{
        handler_fn, BoxFuture, BoxedHandler, ConnectionInfo, Handler, Request, RequestId,
        ResponseWriter,
    };

    pub use micro_router::{HandlerRouter, Params, RouteError, RouteRegistry};

    pub use micro_middleware::{decorate, DecoratorPhase, EndpointDecorator};

    pub use micro_telemetry::{init_logging, LogConfig, LogFormat, SpanProcessing, TracingConfig};

    pub use micro_server::{ServerConfig, ServerError, ServerRuntime, ShutdownSignal};

    pub use micro_service::{
        Endpoint, HookError, HookPhase, Service, ServiceConfig, ServiceError, ServiceSettings,
        ServiceState,
    };
}
