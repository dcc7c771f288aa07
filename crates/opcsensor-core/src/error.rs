// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Errors surfaced across the resource boundary.
//!
//! Protocol crates keep their own detailed taxonomies and convert into
//! [`SensorError`] when a result leaves the resource.
//!
//! ```text
//! SensorError
//! ├── ConfigValidation  - Missing or malformed attributes
//! ├── UnknownModel      - No factory registered
//! ├── Connection        - Session establishment failed
//! ├── Read              - Readings failed
//! ├── InvalidAddress    - Node address does not parse
//! ├── UnencodableValue  - Command value has no wire representation
//! ├── Command           - DoCommand failed
//! ├── CaptureEmpty      - Nothing new to capture (not an error)
//! └── Closed            - Resource already closed
//! ```

use thiserror::Error;

/// A Result type with SensorError.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors returned by [`Sensor`](crate::Sensor) implementations.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A required attribute is missing or invalid.
    #[error("Config validation failed at '{path}': {message}")]
    ConfigValidation {
        /// Resource path or name the config belongs to.
        path: String,
        /// Offending field, when known.
        field: Option<String>,
        /// Description of the problem.
        message: String,
    },

    /// No factory is registered for the requested model.
    #[error("No factory registered for model '{model}'")]
    UnknownModel {
        /// The requested model triplet.
        model: String,
    },

    /// Connecting to the data source failed.
    #[error("Connection failure: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },

    /// Reading from the data source failed.
    #[error("Readings failed: {message}")]
    Read {
        /// Description of the failure.
        message: String,
    },

    /// A node address could not be parsed.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The address as given.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A command value cannot be encoded for its target.
    #[error("Cannot encode value for '{address}': {reason}")]
    UnencodableValue {
        /// The target address.
        address: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A command could not be executed.
    #[error("Command failed: {message}")]
    Command {
        /// Description of the failure.
        message: String,
    },

    /// No new data is available for this capture cycle.
    ///
    /// Capture pipelines skip the cycle when they see this.
    #[error("No new data to capture")]
    CaptureEmpty,

    /// The resource has been closed.
    #[error("Resource is closed")]
    Closed,
}

impl SensorError {
    /// Creates a config validation error for a missing required field.
    pub fn field_required(path: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self::ConfigValidation {
            path: path.into(),
            message: format!("\"{}\" is required", field),
            field: Some(field),
        }
    }

    /// Creates a config validation error.
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            path: path.into(),
            field: None,
            message: message.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// Creates an invalid address error.
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unencodable value error.
    pub fn unencodable_value(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnencodableValue {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Creates a command error.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Returns `true` for the capture-empty sentinel.
    #[inline]
    pub fn is_capture_empty(&self) -> bool {
        matches!(self, Self::CaptureEmpty)
    }

    /// Returns `true` if the caller may retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Read { .. } | Self::CaptureEmpty)
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ConfigValidation { .. } => "config_validation",
            Self::UnknownModel { .. } => "unknown_model",
            Self::Connection { .. } => "connection",
            Self::Read { .. } => "read",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::UnencodableValue { .. } => "unencodable_value",
            Self::Command { .. } => "command",
            Self::CaptureEmpty => "capture_empty",
            Self::Closed => "closed",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
