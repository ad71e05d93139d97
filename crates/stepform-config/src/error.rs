use std::path::PathBuf;
use thiserror::Error;

/// Why configuration could not be loaded. Every variant is fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was given a path that does not exist.
    #[error("no configuration file at {path}")]
    NotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {path}")]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML, or YAML with unknown keys.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed TOML, or TOML with unknown keys.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or JSON with unknown keys.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The extension or format name is not yaml, yml, toml or json.
    #[error("unsupported configuration format {0:?}")]
    UnsupportedFormat(String),

    /// A value parsed but is out of range.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `server.port`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No token signing secret was supplied.
    #[error("token signing secret is not set; export {var}")]
    MissingSecret {
        /// Variable the secret is read from.
        var: String,
    },

    /// An override variable holds a value of the wrong type.
    #[error("cannot apply {var}: {reason}")]
    EnvOverride {
        /// The variable.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A `.env` file is present but malformed.
    #[error("cannot load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_secret(var: impl Into<String>) -> Self {
        Self::MissingSecret { var: var.into() }
    }

    pub(crate) fn env_override(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
