//! Per-request metadata attached by the transport.

use std::net::SocketAddr;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request easy to
/// correlate and sort.
///
/// ```
/// use micro_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Connection the request arrived on.
///
/// Inserted into the request extensions by the server before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    scheme: &'static str,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
}

impl ConnectionInfo {
    /// Creates connection metadata. `tls` selects the `https` scheme.
    #[must_use]
    pub fn new(tls: bool, local_addr: SocketAddr, remote_addr: SocketAddr) -> Self {
        Self {
            scheme: if tls { "https" } else { "http" },
            local_addr,
            remote_addr,
        }
    }

    /// `"http"` or `"https"`.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    /// Returns true for TLS connections.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.scheme == "https"
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Address of the peer.
    #[must_use]
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_unique() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_request_id_display() {
        let uuid = Uuid::now_v7();
        let id = RequestId::from(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_connection_info_scheme() {
        let local: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let remote: SocketAddr = "127.0.0.1:54321".parse().unwrap();

        let plain = ConnectionInfo::new(false, local, remote);
        assert_eq!(plain.scheme(), "http");
        assert!(!plain.is_tls());

        let tls = ConnectionInfo::new(true, local, remote);
        assert_eq!(tls.scheme(), "https");
        assert!(tls.is_tls());
        assert_eq!(tls.local_addr(), local);
        assert_eq!(tls.remote_addr(), remote);
    }
}
