// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the opcsensor binary.

use opcsensor_core::SensorError;
use thiserror::Error;

/// Result type alias for opcsensor-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the opcsensor binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Error surfaced by the sensor resource.
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Sensor(SensorError::ConfigValidation { .. } | SensorError::UnknownModel { .. }) => 1,
            Self::Initialization(_) => 2,
            Self::Runtime(_) => 3,
            Self::Io(_) => 4,
            Self::Sensor(SensorError::Connection { .. }) => 5,
            Self::Sensor(_) => 6,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{:#}", err))
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain on stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BinError::config("missing endpoint");
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_error_with_context() {
        let err = BinError::io("file not found").with_context("Failed to load config");
        assert_eq!(err.to_string(), "Failed to load config: I/O error: file not found");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_sensor_error_exit_codes() {
        let err = BinError::from(SensorError::field_required("plc", "endpoint"));
        assert_eq!(err.exit_code(), 1);

        let err = BinError::from(SensorError::connection("connection refused"));
        assert_eq!(err.exit_code(), 5);

        let err = BinError::from(SensorError::Closed);
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("broken pipe").context("Failed to print readings");
        let err = BinError::from(err);
        assert_eq!(err.to_string(), "Runtime error: Failed to print readings: broken pipe");
    }
}
