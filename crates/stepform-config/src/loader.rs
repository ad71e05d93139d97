//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, environment variables and the signing secret.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{AppConfig, ConfigError, SecretKey};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "server.cfg.yaml";

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "STEPFORM";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (YAML, TOML or JSON)
/// 3. Environment variables
///
/// The signing secret is a separate input: it never comes from a file.
///
/// # Example
///
/// ```no_run
/// use stepform_config::ConfigLoader;
///
/// # fn main() -> Result<(), stepform_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("server.cfg.yaml")?
///     .with_env_prefix("STEPFORM")
///     .with_secret_from_env("JWT_SECRET_KEY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AppConfig,
    env_prefix: Option<String>,
    secret: Option<SecretKey>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            env_prefix: None,
            secret: None,
        }
    }

    /// Load configuration from a file.
    ///
    /// The format is determined by the extension: `.yaml`/`.yml`, `.toml` or
    /// `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file cannot be parsed or contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = Self::parse(&content, &extension)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or `format` is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use stepform_config::{ConfigLoader, SecretKey};
    ///
    /// let yaml = "server:\n  port: 9000\n  baseUrl: /v2\n";
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(yaml, "yaml")
    ///     .unwrap()
    ///     .with_secret(SecretKey::new("k"))
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, 9000);
    /// assert_eq!(config.server.base_url, "/v2");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, for
    /// example `STEPFORM__SERVER__PORT=9000` or `STEPFORM__LOG__PRETTY=true`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the working directory, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Use `secret` as the token signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: SecretKey) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Read the token signing secret from the environment variable `var`.
    ///
    /// An unset variable leaves the secret empty, which `load` rejects.
    #[must_use]
    pub fn with_secret_from_env(self, var: &str) -> Self {
        let secret = env::var(var).map(SecretKey::new).unwrap_or_default();
        self.with_secret(secret)
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment overrides (if a prefix was set), installs the
    /// secret and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed, the secret is
    /// missing, or validation fails.
    pub fn load(mut self) -> Result<AppConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        if let Some(secret) = self.secret.take() {
            self.config.auth.secret = secret;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(mut self) -> AppConfig {
        if let Some(secret) = self.secret.take() {
            self.config.auth.secret = secret;
        }
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<AppConfig, ConfigError> {
        match format {
            "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__"))
        else {
            // e.g. STEPFORM_SEED_USER, which is not a config override
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HOST"] => {
                self.config.server.host = value.to_string();
            }
            ["SERVER", "PORT"] => {
                self.config.server.port = parse_number(key, value)?;
            }
            ["SERVER", "BASE_URL"] => {
                self.config.server.base_url = value.to_string();
            }
            ["SERVER", "PUBLIC_URL"] => {
                self.config.server.public_url = value.to_string();
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = parse_number(key, value)?;
            }

            ["LOG", "LEVEL"] => {
                self.config.log.level = value.to_string();
            }
            ["LOG", "PRETTY"] => {
                self.config.log.pretty = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_override(key, "expected boolean"))?;
            }

            ["AUTH", "TOKEN_TTL_SECS"] => {
                self.config.auth.token_ttl_secs = parse_number(key, value)?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_override(key, "expected integer"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn secret() -> SecretKey {
        SecretKey::new("test-secret")
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().with_secret(secret()).load().unwrap();
        assert_eq!(config.server.http_addr(), "0.0.0.0:8080");
        assert_eq!(config.auth.token_ttl_secs, 3600);
    }

    #[test]
    fn test_loader_without_secret_fails() {
        let result = ConfigLoader::new().load();
        assert!(matches!(result, Err(ConfigError::MissingSecret { .. })));
    }

    #[test]
    fn test_secret_from_unset_env_is_empty() {
        let config = ConfigLoader::new()
            .with_secret_from_env("STEPFORM_TEST_SURELY_UNSET_SECRET")
            .load_unvalidated();
        assert!(config.auth.secret.is_empty());
    }

    #[test]
    fn test_loader_with_string_yaml() {
        let yaml = r"
server:
  port: 3000
  baseUrl: /api
  publicUrl: https://forms.example.com
log:
  level: debug
  pretty: true
";
        let config = ConfigLoader::new()
            .with_string(yaml, "yaml")
            .unwrap()
            .with_secret(secret())
            .load()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.base_url, "/api");
        assert_eq!(config.server.public_url, "https://forms.example.com");
        assert_eq!(config.log.level, "debug");
        assert!(config.log.pretty);
        // Unset keys keep their defaults.
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [server]
            port = 3000
            baseUrl = ""
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .with_secret(secret())
            .load()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.base_url, "");
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"publicUrl": "http://127.0.0.1:3000"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .with_secret(secret())
            .load()
            .unwrap();

        assert_eq!(config.server.public_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "server:\n  portt: 3000\n";
        let result = ConfigLoader::new().with_string(yaml, "yaml");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("", "ini");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/server.cfg.yaml");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/server.cfg.yaml")
            .unwrap()
            .load_unvalidated();

        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_loader_with_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  port: 4321\n  baseUrl: /forms").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .with_secret(secret())
            .load()
            .unwrap();

        assert_eq!(config.server.port, 4321);
        assert_eq!(config.server.base_url, "/forms");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_apply_env_var_server() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__PORT", "9000", "TEST").unwrap();
        loader.apply_env_var("TEST__SERVER__BASE_URL", "/v2", "TEST").unwrap();
        assert_eq!(loader.config.server.port, 9000);
        assert_eq!(loader.config.server.base_url, "/v2");
    }

    #[test]
    fn test_apply_env_var_log() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOG__LEVEL", "warn", "TEST").unwrap();
        loader.apply_env_var("TEST__LOG__PRETTY", "yes", "TEST").unwrap();
        assert_eq!(loader.config.log.level, "warn");
        assert!(loader.config.log.pretty);
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_var("TEST__SERVER__PORT", "eighty", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvOverride { .. })));
    }

    #[test]
    fn test_apply_env_var_ignores_non_override_keys() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST_SEED_USER", "admin", "TEST").unwrap();
        loader.apply_env_var("TEST__UNKNOWN__KEY", "x", "TEST").unwrap();
        assert_eq!(loader.config, AppConfig::default());
    }
}
