//! Logging setup for stepform services.
//!
//! Turns a [`LogConfig`] into an explicit [`stepform_core::Logger`]:
//! JSON lines in production, pretty output for development, filtered at the
//! configured level.

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{build_logger, build_logger_with_writer, LogConfig, MemoryWriter};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
