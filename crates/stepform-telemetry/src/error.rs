//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while building a logger.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or filter directive could not be parsed.
    #[error("Invalid log level '{directive}': {reason}")]
    InvalidLevel {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidLevel {
            directive: "loud".to_string(),
            reason: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid log level 'loud': bad");
    }
}
