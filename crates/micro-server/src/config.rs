//! Server configuration types.
//!
//! ```rust
//! use micro_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .hostname("127.0.0.1")
//!     .port(8080)
//!     .shutdown_timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.bind_addr(), "127.0.0.1:8080");
//! ```

use crate::error::ServerError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hostname used when none is configured.
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Certificate chain and private key, both PEM encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    cert: PathBuf,
    key: PathBuf,
}

impl TlsPaths {
    /// Creates TLS paths.
    pub fn new(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }

    /// Path of the PEM certificate chain.
    #[must_use]
    pub fn cert(&self) -> &Path {
        &self.cert
    }

    /// Path of the PEM private key.
    #[must_use]
    pub fn key(&self) -> &Path {
        &self.key
    }
}

/// Server configuration. Immutable once built.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    hostname: String,
    /// 0 asks the OS for an ephemeral port.
    port: u16,
    tls: Option<TlsPaths>,
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the hostname to bind.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the port to bind. 0 means ephemeral.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the TLS material, if TLS is enabled.
    #[must_use]
    pub fn tls(&self) -> Option<&TlsPaths> {
        self.tls.as_ref()
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the `host:port` string handed to the listener.
    ///
    /// IPv6 literals are bracketed.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: 0,
            tls: None,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

/// Builder for [`ServerConfig`].
///
/// Out-of-range values fall back to defaults: an empty hostname becomes
/// [`DEFAULT_HOSTNAME`], a negative port becomes 0 (ephemeral) and a zero
/// timeout becomes [`DEFAULT_SHUTDOWN_TIMEOUT_SECS`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    hostname: Option<String>,
    port: i32,
    cert: Option<PathBuf>,
    key: Option<PathBuf>,
    shutdown_timeout: Option<Duration>,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hostname.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Sets the port. Zero or negative selects an ephemeral port.
    pub fn port(mut self, port: i32) -> Self {
        self.port = port;
        self
    }

    /// Enables TLS with a PEM certificate chain and private key.
    pub fn tls(self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.certificate_path(cert).key_path(key)
    }

    /// Sets the certificate path alone. TLS needs [`key_path`](Self::key_path) too.
    pub fn certificate_path(mut self, cert: impl Into<PathBuf>) -> Self {
        self.cert = Some(cert.into());
        self
    }

    /// Sets the private key path alone.
    pub fn key_path(mut self, key: impl Into<PathBuf>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the graceful shutdown timeout.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Sets the graceful shutdown timeout in whole seconds.
    pub fn shutdown_timeout_secs(self, secs: i64) -> Self {
        self.shutdown_timeout(Duration::from_secs(u64::try_from(secs).unwrap_or(0)))
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] if only one of the certificate
    /// and key paths is set, or if the port is above 65535.
    pub fn build(self) -> Result<ServerConfig, ServerError> {
        let hostname = self
            .hostname
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

        let port = u16::try_from(self.port.max(0))
            .map_err(|_| ServerError::InvalidConfig(format!("port {} is out of range", self.port)))?;

        let cert = self.cert.filter(|p| !p.as_os_str().is_empty());
        let key = self.key.filter(|p| !p.as_os_str().is_empty());
        let tls = match (cert, key) {
            (Some(cert), Some(key)) => Some(TlsPaths { cert, key }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ServerError::InvalidConfig(
                    "TLS certificate configured without a private key".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ServerError::InvalidConfig(
                    "TLS private key configured without a certificate".to_string(),
                ))
            }
        };

        let shutdown_timeout = self
            .shutdown_timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS));

        Ok(ServerConfig {
            hostname,
            port,
            tls,
            shutdown_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::builder().build().unwrap();
        assert_eq!(config.hostname(), "localhost");
        assert_eq!(config.port(), 0);
        assert!(config.tls().is_none());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_empty_hostname_defaults() {
        let config = ServerConfig::builder().hostname("").build().unwrap();
        assert_eq!(config.hostname(), DEFAULT_HOSTNAME);
    }

    #[test]
    fn test_negative_port_is_ephemeral() {
        let config = ServerConfig::builder().port(-1).build().unwrap();
        assert_eq!(config.port(), 0);
    }

    #[test]
    fn test_port_out_of_range() {
        let result = ServerConfig::builder().port(70_000).build();
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_positive_timeout_defaults() {
        let config = ServerConfig::builder()
            .shutdown_timeout_secs(-3)
            .build()
            .unwrap();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));

        let config = ServerConfig::builder()
            .shutdown_timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));

        let config = ServerConfig::builder()
            .shutdown_timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_tls_requires_both_paths() {
        let result = ServerConfig::builder().certificate_path("cert.pem").build();
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));

        let result = ServerConfig::builder().key_path("key.pem").build();
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));

        let config = ServerConfig::builder()
            .tls("cert.pem", "key.pem")
            .build()
            .unwrap();
        let tls = config.tls().unwrap();
        assert_eq!(tls.cert(), Path::new("cert.pem"));
        assert_eq!(tls.key(), Path::new("key.pem"));
    }

    #[test]
    fn test_empty_tls_paths_mean_plaintext() {
        let config = ServerConfig::builder().tls("", "").build().unwrap();
        assert!(config.tls().is_none());
    }

    #[test]
    fn test_bind_addr_brackets_ipv6() {
        let config = ServerConfig::builder()
            .hostname("::1")
            .port(9000)
            .build()
            .unwrap();
        assert_eq!(config.bind_addr(), "[::1]:9000");
    }
}
