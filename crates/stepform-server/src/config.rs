//! Listener settings.
//!
//! ```rust
//! use stepform_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::new("127.0.0.1:3000")
//!     .with_shutdown_timeout(Duration::from_secs(5));
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:3000");
//! assert_eq!(config.request_timeout(), Duration::from_secs(30));
//! ```

use std::time::Duration;

/// Address bound when none is configured.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where to listen and how long to wait on slow peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    http_addr: String,
    shutdown_timeout: Duration,
    request_timeout: Duration,
}

impl ServerConfig {
    /// Listens on `http_addr` (`host:port`; the host may be a name).
    #[must_use]
    pub fn new(http_addr: impl Into<String>) -> Self {
        Self {
            http_addr: http_addr.into(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Grace period for open connections once shutdown starts.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Upper bound for receiving a complete request body.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The configured bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Body read timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_ADDR)
    }
}
