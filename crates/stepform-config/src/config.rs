//! Configuration types.
//!
//! [`AppConfig`] is the root of the configuration tree. Keys are camelCase in
//! every file format, matching `server.cfg.yaml`:
//!
//! ```yaml
//! server:
//!   port: 8080
//!   baseUrl: /api/v1
//!   publicUrl: http://localhost:8080
//! log:
//!   level: info
//!   pretty: false
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stepform_telemetry::LogConfig;

use crate::{ConfigError, SecretKey, SECRET_ENV_VAR};

/// Complete stepform configuration.
///
/// # Example
///
/// ```
/// use stepform_config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.server.port, 8080);
/// assert_eq!(config.server.base_url, "/api/v1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSection,

    /// Token settings.
    #[serde(default)]
    pub auth: AuthSection,
}

impl AppConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first offending field, or
    /// `ConfigError::MissingSecret` when no signing secret was provided.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid_value("server.port", "must be non-zero"));
        }

        let base = &self.server.base_url;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ConfigError::invalid_value(
                "server.baseUrl",
                format!("must start with '/' and not end with '/': {base}"),
            ));
        }

        if self.server.public_url.is_empty() {
            return Err(ConfigError::invalid_value("server.publicUrl", "must not be empty"));
        }

        if let Err(e) = stepform_telemetry::logging::create_filter(&self.log.level) {
            return Err(ConfigError::invalid_value("log.level", e.to_string()));
        }

        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::invalid_value("auth.tokenTtlSecs", "must be non-zero"));
        }

        if self.auth.secret.is_empty() {
            return Err(ConfigError::missing_secret(SECRET_ENV_VAR));
        }

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ServerSection {
    /// Interface to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Prefix of every API route, e.g. `/api/v1`.
    pub base_url: String,

    /// Externally visible origin used to build resource links.
    pub public_url: String,

    /// Grace period for in-flight connections on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Upper bound for reading a request body.
    pub request_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "/api/v1".to_string(),
            public_url: "http://localhost:8080".to_string(),
            shutdown_timeout_secs: 30,
            request_timeout_ms: 30_000,
        }
    }
}

impl ServerSection {
    /// `host:port` as a bindable address string.
    #[must_use]
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shutdown grace period.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request body read timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// Minimum level.
    pub level: String,

    /// Human-readable output instead of JSON lines.
    pub pretty: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            pretty: false,
        }
    }
}

impl LogSection {
    /// Converts into the logger builder's configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level.clone(),
            pretty: self.pretty,
            ..LogConfig::default()
        }
    }
}

/// Token settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct AuthSection {
    /// Lifetime of issued tokens.
    pub token_ttl_secs: u64,

    /// Signing secret. Only ever read from the environment.
    #[serde(skip)]
    pub secret: SecretKey,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            token_ttl_secs: 3600,
            secret: SecretKey::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.secret = SecretKey::new("test-secret");
        config
    }

    #[test]
    fn test_defaults_validate_with_secret() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = valid();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_shape() {
        for (base, ok) in [("", true), ("/api", true), ("api", false), ("/api/", false)] {
            let mut config = valid();
            config.server.base_url = base.to_string();
            assert_eq!(config.validate().is_ok(), ok, "{base}");
        }
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = valid();
        config.log.level = "chatty".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log.level"));
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_string(&valid()).unwrap();
        assert!(!json.contains("test-secret"));
        assert!(json.contains("baseUrl"));
    }

    #[test]
    fn test_log_section_conversion() {
        let section = LogSection {
            level: "debug".to_string(),
            pretty: true,
        };
        let log = section.to_log_config();
        assert_eq!(log.level, "debug");
        assert!(log.pretty);
    }
}
