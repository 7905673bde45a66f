//! Listener-bound server runtime.
//!
//! A [`ServerRuntime`] binds once, serves on background tasks and drains on
//! [`stop`](ServerRuntime::stop). Two tasks are spawned by `start`:
//!
//! - the accept loop, which hands every connection to its own task
//! - the drain task, which waits for the stop request, drains connections
//!   within the shutdown timeout and acknowledges with the outcome
//!
//! # Example
//!
//! ```rust,no_run
//! use micro_core::handler_fn;
//! use micro_server::{ServerConfig, ServerRuntime};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), micro_server::ServerError> {
//! let hello = handler_fn(|w, _r| {
//!     Box::pin(async move {
//!         w.write("Hello World!");
//!     })
//! });
//!
//! let server = ServerRuntime::new(ServerConfig::default(), Arc::new(hello));
//! server.start().await?;
//! println!("listening on {server}");
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use micro_core::{BoxedHandler, ConnectionInfo, RequestId, Response, ResponseWriter};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::tls;

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

type DrainAck = oneshot::Sender<Result<(), ServerError>>;

#[derive(Debug)]
enum Phase {
    Configured,
    Starting,
    Running(oneshot::Sender<DrainAck>),
    Stopped,
}

/// One run of an HTTP(S) server.
///
/// Lifecycle: configured, then running after [`start`](Self::start), then
/// stopped after [`stop`](Self::stop). A stopped runtime cannot be started
/// again; build a new one instead.
///
/// Dropping a running runtime without calling `stop` still drains it in the
/// background.
pub struct ServerRuntime {
    config: ServerConfig,
    handler: BoxedHandler,
    address: RwLock<String>,
    phase: Mutex<Phase>,
}

impl ServerRuntime {
    /// Creates a runtime that will serve `handler` with `config`.
    #[must_use]
    pub fn new(config: ServerConfig, handler: BoxedHandler) -> Self {
        let address = RwLock::new(config.bind_addr());
        Self {
            config,
            handler,
            address,
            phase: Mutex::new(Phase::Configured),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the bound `host:port` once started, the configured one before.
    #[must_use]
    pub fn address(&self) -> String {
        self.address.read().clone()
    }

    /// Returns true between a successful `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.phase.lock(), Phase::Running(_))
    }

    /// Binds the listener and launches the serve loop.
    ///
    /// Returns once the listener is bound. TLS material is loaded before
    /// binding, so a bad certificate never leaves a listener behind.
    ///
    /// # Errors
    ///
    /// - [`ServerError::AlreadyStarted`] if this runtime was started before
    /// - [`ServerError::Tls`] if the certificate or key cannot be loaded
    /// - [`ServerError::Bind`] if the address is unavailable or malformed
    pub async fn start(&self) -> Result<(), ServerError> {
        {
            let mut phase = self.phase.lock();
            if !matches!(*phase, Phase::Configured) {
                return Err(ServerError::AlreadyStarted);
            }
            *phase = Phase::Starting;
        }

        match self.launch().await {
            Ok(stop_tx) => {
                *self.phase.lock() = Phase::Running(stop_tx);
                Ok(())
            }
            Err(e) => {
                *self.phase.lock() = Phase::Configured;
                Err(e)
            }
        }
    }

    async fn launch(&self) -> Result<oneshot::Sender<DrainAck>, ServerError> {
        let acceptor = self.config.tls().map(tls::load_acceptor).transpose()?;

        let requested = self.config.bind_addr();
        let listener = TcpListener::bind(&requested)
            .await
            .map_err(|source| ServerError::Bind {
                address: requested.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind {
                address: requested,
                source,
            })?;
        *self.address.write() = local_addr.to_string();

        let draining = ShutdownSignal::new();
        let force = ShutdownSignal::new();
        let tracker = ConnectionTracker::new();

        let accepting = tokio::spawn(accept_loop(
            listener,
            local_addr,
            acceptor,
            Arc::clone(&self.handler),
            Signals {
                draining: draining.clone(),
                force: force.clone(),
            },
            tracker.clone(),
        ));

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(drain(
            stop_rx,
            accepting,
            Signals { draining, force },
            tracker,
            self.config.shutdown_timeout(),
        ));

        tracing::info!(
            address = %local_addr,
            tls = self.config.tls().is_some(),
            "Server listening"
        );
        Ok(stop_tx)
    }

    /// Requests a graceful drain and waits for it to finish.
    ///
    /// New connections are refused at once. In-flight requests get up to the
    /// configured shutdown timeout, after which their connections are closed.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotRunning`] before `start` or after an earlier `stop`
    /// - [`ServerError::DrainTimeout`] if connections had to be force-closed
    /// - [`ServerError::DrainAborted`] if the drain task is gone
    pub async fn stop(&self) -> Result<(), ServerError> {
        let stop_tx = {
            let mut phase = self.phase.lock();
            match std::mem::replace(&mut *phase, Phase::Stopped) {
                Phase::Running(stop_tx) => stop_tx,
                other => {
                    *phase = other;
                    return Err(ServerError::NotRunning);
                }
            }
        };

        let address = self.address();
        tracing::info!(%address, "Stopping server");

        let (ack_tx, ack_rx) = oneshot::channel();
        stop_tx
            .send(ack_tx)
            .map_err(|_| ServerError::DrainAborted)?;
        let result = ack_rx.await.map_err(|_| ServerError::DrainAborted)?;

        match &result {
            Ok(()) => tracing::info!(%address, "Server stopped"),
            Err(e) => tracing::warn!(%address, error = %e, "Server stopped with drain error"),
        }
        result
    }
}

impl fmt::Display for ServerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.config.tls().is_some() {
            "https"
        } else {
            "http"
        };
        write!(f, "{scheme}://{}", self.address())
    }
}

impl fmt::Debug for ServerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRuntime")
            .field("address", &self.address())
            .field("tls", &self.config.tls().is_some())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Signals {
    /// Stop accepting and finish in-flight requests.
    draining: ShutdownSignal,
    /// Drop whatever is still open.
    force: ShutdownSignal,
}

async fn drain(
    requests: oneshot::Receiver<DrainAck>,
    accepting: JoinHandle<()>,
    signals: Signals,
    tracker: ConnectionTracker,
    timeout: Duration,
) {
    // A dropped runtime drains without anyone to answer.
    let ack = requests.await.ok();

    signals.draining.trigger();
    let drained = async {
        // The listener is closed once the accept loop returns.
        let _ = accepting.await;
        tracker.wait_idle().await;
    };
    let result = match tokio::time::timeout(timeout, drained).await {
        Ok(()) => Ok(()),
        Err(_) => {
            let remaining = tracker.active_connections();
            signals.force.trigger();
            Err(ServerError::DrainTimeout { timeout, remaining })
        }
    };

    if let Some(ack) = ack {
        let _ = ack.send(result);
    }
}

async fn accept_loop(
    listener: TcpListener,
    local_addr: SocketAddr,
    acceptor: Option<TlsAcceptor>,
    handler: BoxedHandler,
    signals: Signals,
    tracker: ConnectionTracker,
) {
    let stopped = signals.draining.recv();
    tokio::pin!(stopped);

    loop {
        tokio::select! {
            biased;
            () = &mut stopped => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    let token = tracker.acquire();
                    let connection = Connection {
                        handler: Arc::clone(&handler),
                        info: ConnectionInfo::new(acceptor.is_some(), local_addr, remote_addr),
                        signals: signals.clone(),
                    };
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        connection.run(stream, acceptor).await;
                        drop(token);
                    });
                }
                Err(e) => {
                    tracing::error!(address = %local_addr, error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    drop(listener);
    tracing::debug!(address = %local_addr, "Listener closed");
}

struct Connection {
    handler: BoxedHandler,
    info: ConnectionInfo,
    signals: Signals,
}

impl Connection {
    async fn run(self, stream: TcpStream, acceptor: Option<TlsAcceptor>) {
        let Some(acceptor) = acceptor else {
            return self.serve(stream).await;
        };

        // No request can be in flight before the handshake completes, so a
        // drain drops a pending handshake right away.
        let draining = self.signals.draining.recv();
        let force = self.signals.force.recv();
        tokio::select! {
            handshake = acceptor.accept(stream) => match handshake {
                Ok(tls_stream) => self.serve(tls_stream).await,
                Err(e) => tracing::debug!(
                    remote = %self.info.remote_addr(),
                    error = %e,
                    "TLS handshake failed"
                ),
            },
            () = draining => {
                tracing::debug!(remote = %self.info.remote_addr(), "Dropped pending TLS handshake");
            }
            () = force => {}
        }
    }

    async fn serve<I>(self, io: I)
    where
        I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let Self {
            handler,
            info,
            signals,
        } = self;
        let remote = info.remote_addr();

        let service = service_fn(move |request| dispatch(Arc::clone(&handler), info.clone(), request));
        let conn = http1::Builder::new().serve_connection(TokioIo::new(io), service);
        tokio::pin!(conn);

        let draining = signals.draining.recv();
        tokio::pin!(draining);
        let force = signals.force.recv();
        tokio::pin!(force);

        let mut closing = false;
        loop {
            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(e) = result {
                        tracing::debug!(%remote, error = %e, "Connection ended with error");
                    }
                    break;
                }
                () = &mut draining, if !closing => {
                    conn.as_mut().graceful_shutdown();
                    closing = true;
                }
                () = &mut force => {
                    tracing::debug!(%remote, "Connection force-closed");
                    break;
                }
            }
        }
    }
}

/// Collects the body, runs the handler and turns a panic into a 500.
async fn dispatch(
    handler: BoxedHandler,
    info: ConnectionInfo,
    request: http::Request<Incoming>,
) -> Result<Response, Infallible> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(remote = %info.remote_addr(), error = %e, "Failed to read request body");
            return Ok(plain_error(StatusCode::BAD_REQUEST));
        }
    };

    let request_id = RequestId::new();
    let mut request = http::Request::from_parts(parts, body);
    request.extensions_mut().insert(info);
    request.extensions_mut().insert(request_id);

    let mut writer = ResponseWriter::new();
    let outcome = AssertUnwindSafe(handler.serve(&mut writer, &mut request))
        .catch_unwind()
        .await;
    if outcome.is_err() {
        tracing::error!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            "Handler panicked"
        );
        return Ok(plain_error(StatusCode::INTERNAL_SERVER_ERROR));
    }

    let response = writer.into_response();
    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        status = response.status().as_u16(),
        "Request served"
    );
    Ok(response)
}

fn plain_error(status: StatusCode) -> Response {
    let mut writer = ResponseWriter::new();
    writer.write_header(status);
    writer.write(format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default().to_lowercase()
    ));
    writer.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use micro_core::handler_fn;

    fn hello() -> BoxedHandler {
        Arc::new(handler_fn(|w, _r| {
            Box::pin(async move {
                w.write("Hello World!");
            })
        }))
    }

    fn local() -> ServerConfig {
        ServerConfig::builder().hostname("127.0.0.1").build().unwrap()
    }

    #[test]
    fn test_address_before_start_is_configured() {
        let server = ServerRuntime::new(local(), hello());
        assert_eq!(server.address(), "127.0.0.1:0");
        assert_eq!(server.to_string(), "http://127.0.0.1:0");
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_start_records_bound_address() {
        let server = ServerRuntime::new(local(), hello());
        server.start().await.unwrap();
        assert!(server.is_running());

        let addr: SocketAddr = server.address().parse().unwrap();
        assert_ne!(addr.port(), 0);

        server.stop().await.unwrap();
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_lifecycle_guards() {
        let server = ServerRuntime::new(local(), hello());
        assert!(matches!(server.stop().await, Err(ServerError::NotRunning)));

        server.start().await.unwrap();
        assert!(matches!(
            server.start().await,
            Err(ServerError::AlreadyStarted)
        ));

        server.stop().await.unwrap();
        assert!(matches!(server.stop().await, Err(ServerError::NotRunning)));
        assert!(matches!(
            server.start().await,
            Err(ServerError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_bind_error_allows_retry() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let config = ServerConfig::builder()
            .hostname("127.0.0.1")
            .port(i32::from(port))
            .build()
            .unwrap();

        let server = ServerRuntime::new(config, hello());
        let err = server.start().await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(!server.is_running());

        drop(taken);
        server.start().await.unwrap();
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_tls_material_fails_before_bind() {
        let config = ServerConfig::builder()
            .hostname("127.0.0.1")
            .tls("/nonexistent/cert.pem", "/nonexistent/key.pem")
            .build()
            .unwrap();
        let server = ServerRuntime::new(config, hello());

        assert!(matches!(server.start().await, Err(ServerError::Tls(_))));
        assert_eq!(server.address(), "127.0.0.1:0");
    }

    #[tokio::test]
    async fn test_plain_error_body() {
        let response = plain_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"500 internal server error\n");
    }
}
