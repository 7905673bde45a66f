//! # Micro Service
//!
//! Runs a set of HTTP(S) endpoints as a managed service.
//!
//! - [`Service`] - registers endpoints, starts and stops the server, runs
//!   lifecycle hooks and reacts to OS signals or a cancellation signal
//! - [`Endpoint`] - method, pattern, handler and decorators of one route
//! - [`ServiceConfig`] - server settings, hooks, signal handling and tracing
//! - [`ServiceSettings`] - the scalar settings, loadable from TOML and the environment
//!
//! ## Request pipeline
//!
//! ```text
//! router ─▶ trace span ─▶ before decorators ─▶ handler ─▶ after decorators
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use micro_core::handler_fn;
//! use micro_service::{Endpoint, Service, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::new("greeter", env!("CARGO_PKG_VERSION"));
//!     service.init(
//!         ServiceConfig::builder()
//!             .port(8080)
//!             .after_start(|| async {
//!                 tracing::info!("ready");
//!                 Ok(())
//!             })
//!             .build()?,
//!     )?;
//!
//!     service.endpoints([Endpoint::get("hello", "/", handler_fn(|w, _r| {
//!         Box::pin(async move {
//!             w.write("Hello World!");
//!         })
//!     }))])?;
//!
//!     service.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     service.stop().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/micro-service/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod endpoint;
mod error;
mod hooks;
mod service;
pub mod settings;
mod signals;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use endpoint::Endpoint;
pub use error::ServiceError;
pub use hooks::{HookError, HookPhase, HookResult, LifecycleHook, LifecycleHooks};
pub use service::{Service, ServiceState};
pub use settings::{ServiceSettings, SettingsError};
