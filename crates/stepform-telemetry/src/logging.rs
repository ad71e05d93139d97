//! Structured logging for stepform.
//!
//! Builds the process [`Logger`] from a [`LogConfig`]. Nothing here touches
//! global state: the returned logger is handed to the pipeline explicitly,
//! and the binary decides separately whether to install it as the process
//! default.
//!
//! # Example
//!
//! ```rust,ignore
//! use stepform_telemetry::logging::{build_logger, LogConfig};
//!
//! let logger = build_logger(&LogConfig::default())?;
//! logger.in_scope(|| tracing::info!(port = 8080, "Starting server"));
//! ```

use std::io;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use stepform_core::Logger;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,

    /// Human-readable output instead of one JSON object per line.
    pub pretty: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            pretty: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            pretty: true,
            include_target: true,
        }
    }
}

/// Builds a logger writing to stdout.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidLevel` if the level cannot be parsed.
pub fn build_logger(config: &LogConfig) -> TelemetryResult<Logger> {
    build_logger_with_writer(config, io::stdout)
}

/// Builds a logger writing to `writer`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidLevel` if the level cannot be parsed.
pub fn build_logger_with_writer<W>(config: &LogConfig, writer: W) -> TelemetryResult<Logger>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = create_filter(&config.level)?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.pretty {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(writer)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed()
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer);
    Ok(Logger::new(Dispatch::new(subscriber)))
}

/// Creates a filter from a level name (`"info"`) or a directive list
/// (`"stepform=debug,hyper=warn"`).
///
/// # Errors
///
/// Returns `TelemetryError::InvalidLevel` if the directive cannot be parsed.
/// A single word must be a level name; a bare target is rejected.
pub fn create_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    let invalid = |reason: String| TelemetryError::InvalidLevel {
        directive: directive.to_string(),
        reason,
    };

    if directive.contains(['=', ',']) {
        return EnvFilter::try_new(directive).map_err(|e| invalid(e.to_string()));
    }

    let level = LevelFilter::from_str(directive).map_err(|e| invalid(e.to_string()))?;
    EnvFilter::try_new(level.to_string()).map_err(|e| invalid(e.to_string()))
}

/// Field names of the access-log record.
pub mod fields {
    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// HTTP method field name.
    pub const METHOD: &str = "method";

    /// Path plus query field name.
    pub const PATH: &str = "path";

    /// Response status field name.
    pub const STATUS: &str = "status";

    /// Latency field name (microseconds).
    pub const LATENCY: &str = "latency";

    /// Client IP field name.
    pub const IP: &str = "ip";

    /// Message field name.
    pub const MESSAGE: &str = "message";

    /// Level field name.
    pub const LEVEL: &str = "level";
}

/// In-memory log sink, one JSON record per line.
///
/// Cloning shares the buffer, so a test can hand one clone to
/// [`build_logger_with_writer`] and read records back through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemoryWriter {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Parses every line as a JSON record, skipping lines that are not JSON.
    #[must_use]
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl io::Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MemoryWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
