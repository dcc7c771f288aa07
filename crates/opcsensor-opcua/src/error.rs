// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA acquisition error types.
//!
//! Errors are grouped by the stage of the acquisition pipeline they come
//! from. Each group reports its own severity, error code and recovery hints
//! so callers can log and decide without matching on every variant.
//!
//! # Error Categories
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Endpoint discovery and transport failures
//! ├── Session       - Session or secure channel invalidated by the server
//! ├── Operation     - Read/write failures, exhausted or cancelled retries
//! ├── Subscription  - Subscription and monitored item failures
//! ├── Conversion    - Values that cannot be encoded for a write
//! └── Configuration - Invalid attributes and malformed node identifiers
//! ```
//!
//! # Examples
//!
//! ```
//! use opcsensor_opcua::error::{ConnectionError, OpcUaError};
//!
//! let error = OpcUaError::connection(ConnectionError::refused(
//!     "opc.tcp://localhost:4840",
//!     "no route to host",
//! ));
//! assert_eq!(error.category(), "connection");
//! assert!(!error.recovery_hints().is_empty());
//! ```

use std::fmt;

use opcsensor_core::SensorError;
use thiserror::Error;
use tracing::Level;

use crate::status::StatusCode;

// =============================================================================
// OpcUaError - Main Error Type
// =============================================================================

/// The main error type for OPC UA acquisition.
#[derive(Debug, Error)]
pub enum OpcUaError {
    /// Connection-related errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Session invalidation errors.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Read/write operation errors.
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Subscription and monitoring errors.
    #[error("{0}")]
    Subscription(#[from] SubscriptionError),

    /// Value encoding errors.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl OpcUaError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a session error.
    #[inline]
    pub fn session(error: SessionError) -> Self {
        Self::Session(error)
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(error: OperationError) -> Self {
        Self::Operation(error)
    }

    /// Creates a subscription error.
    #[inline]
    pub fn subscription(error: SubscriptionError) -> Self {
        Self::Subscription(error)
    }

    /// Creates a conversion error.
    #[inline]
    pub fn conversion(error: ConversionError) -> Self {
        Self::Conversion(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates an invalid node id error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::invalid_node_id(node_id, reason))
    }

    /// Creates a cancelled operation error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Operation(OperationError::Cancelled {
            operation: operation.into(),
        })
    }

    /// Maps a service-level status code returned by a read request.
    ///
    /// Session and channel invalidations become [`SessionError::Invalidated`],
    /// dropped transports become [`ConnectionError::Closed`] and everything
    /// else is a read failure.
    pub fn from_read_status(status: StatusCode) -> Self {
        if status.is_session_invalidation() {
            Self::Session(SessionError::invalidated(status))
        } else if status.is_connection_loss() {
            Self::Connection(ConnectionError::closed(Some(status.label())))
        } else {
            Self::Operation(OperationError::read_failed_with_status(
                "batch",
                "Read request rejected",
                status,
            ))
        }
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns the OPC UA status code carried by this error, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Session(SessionError::Invalidated { status_code }) => Some(*status_code),
            Self::Operation(e) => e.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if the transport reported an end of stream.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Connection(ConnectionError::Closed { .. }))
    }

    /// Returns `true` if this error is retryable.
    ///
    /// This is the default classification; the read path uses its own
    /// configurable policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Session(_) => true,
            Self::Operation(e) => e.is_retryable(),
            Self::Subscription(_) | Self::Conversion(_) | Self::Configuration(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Session(_) => ErrorSeverity::Warning,
            Self::Operation(e) => e.severity(),
            Self::Subscription(e) => e.severity(),
            Self::Conversion(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Session(_) => "session",
            Self::Operation(_) => "operation",
            Self::Subscription(_) => "subscription",
            Self::Conversion(_) => "conversion",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Operation(e) => e.error_code(),
            Self::Subscription(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Connection(e) => e.recovery_hints(),
            Self::Session(_) => vec![
                "The client recreates the session automatically",
                "Check the server session limits if this persists",
            ],
            Self::Operation(e) => e.recovery_hints(),
            Self::Subscription(_) => vec![
                "Verify the server supports subscriptions",
                "Check that every monitored node exists",
            ],
            Self::Conversion(_) => vec![
                "Write booleans, numbers or strings",
                "Use {\"type\": \"Int32\", \"value\": 5} to pick a data type",
            ],
            Self::Configuration(e) => e.recovery_hints(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let code = self.error_code();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The server refused the connection or session.
    #[error("Connection refused to '{endpoint}': {reason}")]
    Refused {
        /// Target endpoint.
        endpoint: String,
        /// Reason reported by the client library.
        reason: String,
    },

    /// Endpoint discovery failed.
    #[error("Endpoint not found: '{endpoint}': {reason}")]
    EndpointNotFound {
        /// The endpoint URL.
        endpoint: String,
        /// Reason reported by the client library.
        reason: String,
    },

    /// The server offers no endpoint with the requested security.
    #[error("No suitable endpoint found with security mode '{security_mode}'")]
    NoSuitableEndpoint {
        /// Requested security mode.
        security_mode: String,
    },

    /// The endpoint URL is malformed.
    #[error("Invalid endpoint URL: '{url}' - {reason}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Reason.
        reason: String,
    },

    /// The transport reached end of stream.
    #[error("Connection closed{}", reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    Closed {
        /// Reason for closure.
        reason: Option<String>,
    },

    /// No session is open.
    #[error("Not connected to OPC UA server")]
    NotConnected,
}

impl ConnectionError {
    /// Creates a connection refused error.
    pub fn refused(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Refused {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates an endpoint not found error.
    pub fn endpoint_not_found(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EndpointNotFound {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a no suitable endpoint error.
    pub fn no_suitable_endpoint(security_mode: impl Into<String>) -> Self {
        Self::NoSuitableEndpoint {
            security_mode: security_mode.into(),
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an end of stream error.
    pub fn closed(reason: Option<String>) -> Self {
        Self::Closed { reason }
    }

    /// Returns `true` if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Refused { .. } | Self::EndpointNotFound { .. } | Self::Closed { .. }
        )
    }

    /// Returns the severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Closed { .. } => ErrorSeverity::Warning,
            Self::InvalidEndpoint { .. } | Self::NoSuitableEndpoint { .. } => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Refused { .. } => ErrorCode::new(1, 1),
            Self::EndpointNotFound { .. } => ErrorCode::new(1, 2),
            Self::NoSuitableEndpoint { .. } => ErrorCode::new(1, 3),
            Self::InvalidEndpoint { .. } => ErrorCode::new(1, 4),
            Self::Closed { .. } => ErrorCode::new(1, 5),
            Self::NotConnected => ErrorCode::new(1, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Refused { .. } | Self::EndpointNotFound { .. } => vec![
                "Check that the OPC UA server is running",
                "Verify the endpoint host and port",
                "Check firewall rules for the opc.tcp port",
            ],
            Self::NoSuitableEndpoint { .. } => vec![
                "Check which security modes the server exposes",
                "Set security_mode to match the server",
            ],
            Self::InvalidEndpoint { .. } => vec!["Use the form opc.tcp://host:port/path"],
            Self::Closed { .. } => vec!["The client reconnects on the next attempt"],
            Self::NotConnected => vec!["Reconfigure the sensor to open a session"],
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Session lifecycle errors reported by the server.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session or secure channel is no longer valid.
    ///
    /// The client library recreates it on the next request.
    #[error("Session invalidated by server: {status_code}")]
    Invalidated {
        /// Status code reported by the server.
        status_code: StatusCode,
    },
}

impl SessionError {
    /// Creates a session invalidated error.
    pub fn invalidated(status_code: StatusCode) -> Self {
        Self::Invalidated { status_code }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Invalidated { .. } => ErrorCode::new(2, 1),
        }
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// Read/write operation errors.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Read operation failed.
    #[error("Read failed for node '{node_id}': {message}")]
    ReadFailed {
        /// Node ID, or `batch` for a multi-node request.
        node_id: String,
        /// Error message.
        message: String,
        /// OPC UA status code (if available).
        status_code: Option<StatusCode>,
    },

    /// Write operation failed.
    #[error("Write failed for node '{node_id}': {message}")]
    WriteFailed {
        /// Node ID, or `batch` for a multi-node request.
        node_id: String,
        /// Error message.
        message: String,
        /// OPC UA status code (if available).
        status_code: Option<StatusCode>,
    },

    /// The retry cap was reached on transient errors.
    #[error("Read gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Last transient error seen.
        last_error: String,
    },

    /// The operation was cancelled before completing.
    #[error("Operation '{operation}' cancelled")]
    Cancelled {
        /// Operation name.
        operation: String,
    },

    /// The server returned a different number of results than requested.
    #[error("Expected {expected} results, got {actual}")]
    ResultCountMismatch {
        /// Number of nodes requested.
        expected: usize,
        /// Number of results returned.
        actual: usize,
    },
}

impl OperationError {
    /// Creates a read failed error.
    pub fn read_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            node_id: node_id.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates a read failed error with a status code.
    pub fn read_failed_with_status(
        node_id: impl Into<String>,
        message: impl Into<String>,
        status_code: StatusCode,
    ) -> Self {
        Self::ReadFailed {
            node_id: node_id.into(),
            message: format!("{}: {}", message.into(), status_code),
            status_code: Some(status_code),
        }
    }

    /// Creates a write failed error.
    pub fn write_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            node_id: node_id.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates a write failed error with a status code.
    pub fn write_failed_with_status(
        node_id: impl Into<String>,
        message: impl Into<String>,
        status_code: StatusCode,
    ) -> Self {
        Self::WriteFailed {
            node_id: node_id.into(),
            message: format!("{}: {}", message.into(), status_code),
            status_code: Some(status_code),
        }
    }

    /// Returns the status code, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::ReadFailed { status_code, .. } | Self::WriteFailed { status_code, .. } => {
                *status_code
            }
            _ => None,
        }
    }

    /// Returns `true` if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// Returns the severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled { .. } => ErrorSeverity::Info,
            Self::RetriesExhausted { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ReadFailed { .. } => ErrorCode::new(5, 1),
            Self::WriteFailed { .. } => ErrorCode::new(5, 2),
            Self::RetriesExhausted { .. } => ErrorCode::new(5, 3),
            Self::Cancelled { .. } => ErrorCode::new(5, 4),
            Self::ResultCountMismatch { .. } => ErrorCode::new(5, 5),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::ReadFailed { .. } => vec![
                "Verify the node exists and is readable",
                "Check the server diagnostics for the status code",
            ],
            Self::WriteFailed { .. } => vec![
                "Verify the node is writable",
                "Check the node data type matches the written value",
            ],
            Self::RetriesExhausted { .. } => vec![
                "Check server availability",
                "Raise retry.max_attempts or leave it unset to retry indefinitely",
            ],
            Self::Cancelled { .. } => vec!["The session was closed or reconfigured"],
            Self::ResultCountMismatch { .. } => vec!["Check the server implementation"],
        }
    }
}

// =============================================================================
// SubscriptionError
// =============================================================================

/// Subscription and monitored item errors.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// Subscription creation failed.
    #[error("Failed to create subscription: {message}")]
    CreationFailed {
        /// Error message.
        message: String,
    },

    /// Monitored item creation failed.
    #[error("Failed to monitor node '{node_id}': {message}")]
    MonitoredItemFailed {
        /// Node ID, or `batch`.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// Subscription does not exist.
    #[error("Subscription {subscription_id} not found")]
    NotFound {
        /// Subscription ID.
        subscription_id: u32,
    },

    /// Deleting the subscription failed.
    #[error("Failed to delete subscription {subscription_id}: {message}")]
    DeleteFailed {
        /// Subscription ID.
        subscription_id: u32,
        /// Error message.
        message: String,
    },
}

impl SubscriptionError {
    /// Creates a subscription creation error.
    pub fn creation_failed(message: impl Into<String>) -> Self {
        Self::CreationFailed {
            message: message.into(),
        }
    }

    /// Creates a monitored item error.
    pub fn monitored_item_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MonitoredItemFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(subscription_id: u32) -> Self {
        Self::NotFound { subscription_id }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DeleteFailed { .. } | Self::NotFound { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::CreationFailed { .. } => ErrorCode::new(6, 1),
            Self::MonitoredItemFailed { .. } => ErrorCode::new(6, 2),
            Self::NotFound { .. } => ErrorCode::new(6, 3),
            Self::DeleteFailed { .. } => ErrorCode::new(6, 4),
        }
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Errors encoding a generic value into an OPC UA variant.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The value has no OPC UA representation.
    #[error("Cannot encode value for node '{node_id}': {reason}")]
    Unencodable {
        /// Target node.
        node_id: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The value does not fit the requested data type.
    #[error("Value {value} out of range for {data_type} on node '{node_id}'")]
    OutOfRange {
        /// Target node.
        node_id: String,
        /// Requested data type.
        data_type: String,
        /// Rendered value.
        value: String,
    },
}

impl ConversionError {
    /// Creates an unencodable value error.
    pub fn unencodable(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unencodable {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an out of range error.
    pub fn out_of_range(
        node_id: impl Into<String>,
        data_type: impl fmt::Display,
        value: impl fmt::Display,
    ) -> Self {
        Self::OutOfRange {
            node_id: node_id.into(),
            data_type: data_type.to_string(),
            value: value.to_string(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unencodable { .. } => ErrorCode::new(7, 1),
            Self::OutOfRange { .. } => ErrorCode::new(7, 2),
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required field is missing or empty.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A node identifier could not be parsed.
    #[error("Invalid node ID '{node_id}': {reason}")]
    InvalidNodeId {
        /// The invalid node ID.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// The endpoint URL is malformed.
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Reason.
        reason: String,
    },

    /// A field has an unusable value.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Reason.
        reason: String,
    },

    /// The attribute map could not be deserialized.
    #[error("Invalid attributes: {message}")]
    Attributes {
        /// Deserializer message.
        message: String,
    },
}

impl ConfigurationError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid node ID error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } => ErrorCode::new(8, 1),
            Self::InvalidNodeId { .. } => ErrorCode::new(8, 2),
            Self::InvalidEndpoint { .. } => ErrorCode::new(8, 3),
            Self::InvalidValue { .. } => ErrorCode::new(8, 4),
            Self::Attributes { .. } => ErrorCode::new(8, 5),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::MissingField { .. } => vec!["Add the field to the sensor attributes"],
            Self::InvalidNodeId { .. } => vec![
                "Use ns=<index>;i=<number>, ns=<index>;s=<name>, g=<guid> or b=<base64>",
            ],
            Self::InvalidEndpoint { .. } => vec!["Use the form opc.tcp://host:port/path"],
            Self::InvalidValue { .. } | Self::Attributes { .. } => {
                vec!["Check the attribute types against the documentation"]
            }
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Severity levels for errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::DEBUG,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code, rendered as `UA-XXYY`.
///
/// Categories: 1 connection, 2 session, 5 operation, 6 subscription,
/// 7 conversion, 8 configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category.
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UA-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Conversion to SensorError
// =============================================================================

impl From<OpcUaError> for SensorError {
    fn from(error: OpcUaError) -> Self {
        match error {
            OpcUaError::Configuration(ConfigurationError::MissingField { field }) => {
                SensorError::ConfigValidation {
                    path: "attributes".to_string(),
                    message: format!("\"{}\" is required", field),
                    field: Some(field),
                }
            }
            OpcUaError::Configuration(ConfigurationError::InvalidNodeId { node_id, reason }) => {
                SensorError::invalid_address(node_id, reason)
            }
            OpcUaError::Configuration(e) => SensorError::config("attributes", e.to_string()),
            OpcUaError::Connection(e) => SensorError::connection(e.to_string()),
            OpcUaError::Session(e) => SensorError::connection(e.to_string()),
            OpcUaError::Operation(e @ OperationError::WriteFailed { .. }) => {
                SensorError::command(e.to_string())
            }
            OpcUaError::Operation(e) => SensorError::read(e.to_string()),
            OpcUaError::Subscription(e) => SensorError::connection(e.to_string()),
            OpcUaError::Conversion(ConversionError::Unencodable { node_id, reason }) => {
                SensorError::unencodable_value(node_id, reason)
            }
            OpcUaError::Conversion(ConversionError::OutOfRange {
                node_id,
                data_type,
                value,
            }) => SensorError::unencodable_value(
                node_id,
                format!("value {} out of range for {}", value, data_type),
            ),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with OpcUaError.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// Tests
// =============================================================================
