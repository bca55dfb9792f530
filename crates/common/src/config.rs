use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport security mode for an endpoint.
///
/// Multi-location fallback lists are out of scope; one endpoint per reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportSecurity {
    /// Plain HTTP/2, no channel encryption.
    Plaintext,
    /// TLS-encrypted channel.
    Tls,
}

/// One remote data-service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Channel security mode.
    pub security: TransportSecurity,
}

impl Endpoint {
    /// Plaintext endpoint shorthand.
    pub fn insecure(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: TransportSecurity::Plaintext,
        }
    }

    /// Connection URI with the scheme implied by the security mode.
    pub fn uri(&self) -> String {
        let scheme = match self.security {
            TransportSecurity::Plaintext => "http",
            TransportSecurity::Tls => "https",
        };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// `host:port` label used in logs and metrics.
    pub fn label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credentials presented once, during the authentication handshake.
///
/// The reader does not retain them after the handshake.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account user name.
    pub username: String,
    /// Account secret.
    pub secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

// Manual Debug so the secret never lands in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Per-reader tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Deadline for connection establishment plus the authentication handshake.
    pub auth_timeout_ms: u64,
    /// Deadline for each batch receive.
    pub advance_timeout_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            auth_timeout_ms: 10_000,
            advance_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uri_follows_security_mode() {
        let ep = Endpoint::insecure("data-svc", 47470);
        assert_eq!(ep.uri(), "http://data-svc:47470");
        let tls = Endpoint {
            security: TransportSecurity::Tls,
            ..ep
        };
        assert_eq!(tls.uri(), "https://data-svc:47470");
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = Credentials::new("svc-user", "hunter2");
        let printed = format!("{creds:?}");
        assert!(printed.contains("svc-user"));
        assert!(!printed.contains("hunter2"));
    }
}
