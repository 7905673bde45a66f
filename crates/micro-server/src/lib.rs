//! # Micro Server
//!
//! Listener-bound HTTP(S) server runtime for micro services.
//!
//! - [`ServerRuntime`] - bind, serve on background tasks, drain on stop
//! - [`ServerConfig`] - hostname, port, TLS material and shutdown timeout
//! - [`ShutdownSignal`] - cloneable cancellation trigger
//! - [`ConnectionTracker`] - live connection count used by the drain
//!
//! Connections are served with hyper over HTTP/1.1, optionally wrapped in
//! TLS through `tokio-rustls`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use micro_core::handler_fn;
//! use micro_server::{ServerConfig, ServerRuntime};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().hostname("0.0.0.0").port(8080).build()?;
//!     let server = ServerRuntime::new(
//!         config,
//!         Arc::new(handler_fn(|w, _r| Box::pin(async move {
//!             w.write("Hello World!");
//!         }))),
//!     );
//!
//!     server.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/micro-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod server;
mod shutdown;
mod tls;

pub use config::{
    ServerConfig, ServerConfigBuilder, TlsPaths, DEFAULT_HOSTNAME, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ServerError;
pub use server::ServerRuntime;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
