//! Typed configuration for stepform.
//!
//! This crate provides a strongly-typed configuration with support for:
//! - YAML, TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//! - A redacted signing secret read from the environment
//!
//! # Example
//!
//! ```no_run
//! use stepform_config::{ConfigLoader, DEFAULT_CONFIG_FILE, SECRET_ENV_VAR};
//!
//! # fn main() -> Result<(), stepform_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file(DEFAULT_CONFIG_FILE)?
//!     .with_env_prefix("STEPFORM")
//!     .with_secret_from_env(SECRET_ENV_VAR)
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr());
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/stepform-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod secret;

pub use config::{AppConfig, AuthSection, LogSection, ServerSection};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE, DEFAULT_ENV_PREFIX};
pub use secret::{SecretKey, SECRET_ENV_VAR};
