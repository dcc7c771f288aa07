// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport abstraction layer.
//!
//! The acquisition engine talks to the protocol client library only through
//! [`OpcUaTransport`]. One transport instance backs one session; a
//! [`TransportFactory`] creates a fresh instance on every reconfiguration.
//!
//! Change notifications are pushed by the transport into an unbounded
//! channel handed over at subscription time and consumed by the monitor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::{SensorConfig, SubscriptionSettings};
use crate::error::OpcUaResult;
use crate::status::StatusCode;
use crate::types::{NodeId, OpcUaDataType};

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// Transport is not connected, or was closed locally.
    #[default]
    Disconnected,

    /// Transport is establishing connection.
    Connecting,

    /// Transport is connected and ready.
    Connected,

    /// Transport connection has failed.
    Faulted,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if the session was closed locally or never opened.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns `true` once the connection is lost for good.
    #[inline]
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

// =============================================================================
// ReadResult / WriteResult
// =============================================================================

/// Result of reading one node.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// The node ID that was read.
    pub node_id: NodeId,

    /// The value read, absent when the server returned none.
    pub value: Option<OpcUaValue>,

    /// Per-node status.
    pub status_code: StatusCode,

    /// Server timestamp.
    pub server_timestamp: Option<DateTime<Utc>>,

    /// Source timestamp.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl ReadResult {
    /// Creates a good read result.
    pub fn success(node_id: NodeId, value: OpcUaValue) -> Self {
        Self {
            node_id,
            value: Some(value),
            status_code: StatusCode::GOOD,
            server_timestamp: Some(Utc::now()),
            source_timestamp: None,
        }
    }

    /// Creates a read result without value.
    pub fn failure(node_id: NodeId, status_code: StatusCode) -> Self {
        Self {
            node_id,
            value: None,
            status_code,
            server_timestamp: Some(Utc::now()),
            source_timestamp: None,
        }
    }

    /// Returns `true` if the status is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status_code.is_good()
    }
}

/// Result of writing one node.
#[derive(Debug, Clone)]
pub struct WriteResult {
    /// The node ID that was written.
    pub node_id: NodeId,

    /// Status code of the write operation.
    pub status_code: StatusCode,
}

impl WriteResult {
    /// Creates a write result.
    pub fn new(node_id: NodeId, status_code: StatusCode) -> Self {
        Self {
            node_id,
            status_code,
        }
    }

    /// Returns `true` if the write was successful.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status_code.is_good()
    }
}

// =============================================================================
// OpcUaValue
// =============================================================================

/// OPC UA value as exchanged with the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OpcUaValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(DateTime<Utc>),
    /// GUID value.
    Guid(uuid::Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// Array of values.
    Array(Vec<OpcUaValue>),
    /// Null value.
    #[default]
    Null,
}

impl OpcUaValue {
    /// Returns the scalar data type, `None` for arrays and null.
    pub fn data_type(&self) -> Option<OpcUaDataType> {
        let data_type = match self {
            Self::Boolean(_) => OpcUaDataType::Boolean,
            Self::SByte(_) => OpcUaDataType::SByte,
            Self::Byte(_) => OpcUaDataType::Byte,
            Self::Int16(_) => OpcUaDataType::Int16,
            Self::UInt16(_) => OpcUaDataType::UInt16,
            Self::Int32(_) => OpcUaDataType::Int32,
            Self::UInt32(_) => OpcUaDataType::UInt32,
            Self::Int64(_) => OpcUaDataType::Int64,
            Self::UInt64(_) => OpcUaDataType::UInt64,
            Self::Float(_) => OpcUaDataType::Float,
            Self::Double(_) => OpcUaDataType::Double,
            Self::String(_) => OpcUaDataType::String,
            Self::DateTime(_) => OpcUaDataType::DateTime,
            Self::Guid(_) => OpcUaDataType::Guid,
            Self::ByteString(_) => OpcUaDataType::ByteString,
            Self::Array(_) | Self::Null => return None,
        };
        Some(data_type)
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to get the value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::SByte(v) => Some(*v as f64),
            Self::Byte(v) => Some(*v as f64),
            Self::Int16(v) => Some(*v as f64),
            Self::UInt16(v) => Some(*v as f64),
            Self::Int32(v) => Some(*v as f64),
            Self::UInt32(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            Self::UInt64(v) => Some(*v as f64),
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for OpcUaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{}", v),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::Array(v) => write!(f, "[{} items]", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Server-assigned subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl SubscriptionId {
    /// Returns the raw ID value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Request to monitor one node.
#[derive(Debug, Clone)]
pub struct MonitoredItemRequest {
    /// Node to monitor.
    pub node_id: NodeId,

    /// Client-local handle echoed back in every notification for the item.
    pub client_handle: u32,

    /// Requested sampling interval.
    pub sampling_interval: Duration,

    /// Server-side queue size.
    pub queue_size: u32,
}

/// Server response for one monitored item.
#[derive(Debug, Clone)]
pub struct MonitoredItemResult {
    /// Client handle of the request.
    pub client_handle: u32,

    /// Server-assigned item id.
    pub monitored_item_id: u32,

    /// Creation status.
    pub status_code: StatusCode,
}

/// One changed value in a data-change notification.
#[derive(Debug, Clone)]
pub struct ItemNotification {
    /// Client handle of the monitored item.
    pub client_handle: u32,

    /// New value, absent when the server sent none.
    pub value: Option<OpcUaValue>,

    /// Value status.
    pub status_code: StatusCode,

    /// Source timestamp.
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Server timestamp.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl ItemNotification {
    /// Creates a good notification carrying `value`.
    pub fn new(client_handle: u32, value: OpcUaValue) -> Self {
        Self {
            client_handle,
            value: Some(value),
            status_code: StatusCode::GOOD,
            source_timestamp: None,
            server_timestamp: Some(Utc::now()),
        }
    }
}

/// Event delivered on the notification stream of a subscription.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// One publish response worth of changed items, in server order.
    DataChange(Vec<ItemNotification>),

    /// The stream reported an error; the subscription stays active.
    Error(String),
}

/// Sending half of a notification stream.
pub type NotificationSender = mpsc::UnboundedSender<NotificationEvent>;

/// Receiving half of a notification stream.
pub type NotificationReceiver = mpsc::UnboundedReceiver<NotificationEvent>;

// =============================================================================
// OpcUaTransport Trait
// =============================================================================

/// Protocol client operations used by the acquisition engine.
///
/// # Thread Safety
///
/// Every method takes `&self`; implementations synchronize internally so a
/// transport can be shared between the read path, the write path and the
/// monitor through an `Arc`.
#[async_trait]
pub trait OpcUaTransport: Send + Sync {
    /// Connects and activates a session.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the endpoint cannot be reached, no
    /// suitable endpoint exists, or session activation fails.
    async fn connect(&self) -> OpcUaResult<()>;

    /// Closes the session and the underlying connection.
    async fn disconnect(&self) -> OpcUaResult<()>;

    /// Returns the current transport state.
    fn state(&self) -> TransportState;

    /// Returns `true` if the transport is currently connected.
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Reads the Value attribute of several nodes in one request.
    ///
    /// Server and source timestamps are both requested. `max_age` is the
    /// oldest cached value the server may return.
    ///
    /// Results are in request order.
    async fn read_values(
        &self,
        node_ids: &[NodeId],
        max_age: Duration,
    ) -> OpcUaResult<Vec<ReadResult>>;

    /// Writes several node values in one request.
    ///
    /// Results are in request order.
    async fn write_values(&self, writes: &[(NodeId, OpcUaValue)])
        -> OpcUaResult<Vec<WriteResult>>;

    /// Creates a subscription whose notifications are sent to `notifications`.
    async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
        notifications: NotificationSender,
    ) -> OpcUaResult<SubscriptionId>;

    /// Creates monitored items on a subscription, reporting with both
    /// timestamps.
    async fn create_monitored_items(
        &self,
        subscription_id: SubscriptionId,
        items: &[MonitoredItemRequest],
    ) -> OpcUaResult<Vec<MonitoredItemResult>>;

    /// Deletes a subscription and its monitored items.
    async fn delete_subscription(&self, subscription_id: SubscriptionId) -> OpcUaResult<()>;

    /// Returns the server endpoint URL.
    fn endpoint(&self) -> &str;
}

// =============================================================================
// TransportFactory
// =============================================================================

/// Creates one transport per session.
pub trait TransportFactory: Send + Sync {
    /// Creates an unconnected transport for `config`.
    fn create(&self, config: &SensorConfig) -> OpcUaResult<Arc<dyn OpcUaTransport>>;
}

impl<F> TransportFactory for F
where
    F: Fn(&SensorConfig) -> OpcUaResult<Arc<dyn OpcUaTransport>> + Send + Sync,
{
    fn create(&self, config: &SensorConfig) -> OpcUaResult<Arc<dyn OpcUaTransport>> {
        self(config)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_state() {
        assert!(TransportState::Connected.is_connected());
        assert!(!TransportState::Faulted.is_connected());
        assert!(TransportState::Disconnected.is_closed());
        assert!(!TransportState::Faulted.is_closed());
        assert_eq!(TransportState::Faulted.to_string(), "Faulted");
    }

    #[test]
    fn test_read_result() {
        let success = ReadResult::success(NodeId::numeric(2, 1001), OpcUaValue::Double(25.5));
        assert!(success.is_good());

        let failure = ReadResult::failure(NodeId::numeric(2, 1001), StatusCode::BAD_NOT_READABLE);
        assert!(!failure.is_good());
        assert!(failure.value.is_none());
    }

    #[test]
    fn test_opcua_value() {
        assert_eq!(OpcUaValue::Int32(42).as_f64(), Some(42.0));
        assert_eq!(OpcUaValue::Boolean(true).as_f64(), None);
        assert_eq!(OpcUaValue::Double(1.5).data_type(), Some(OpcUaDataType::Double));
        assert_eq!(OpcUaValue::Null.data_type(), None);
        assert!(OpcUaValue::default().is_null());
        assert_eq!(OpcUaValue::ByteString(vec![1, 2]).to_string(), "<2 bytes>");
    }

    #[test]
    fn test_subscription_id_display() {
        assert_eq!(SubscriptionId(7).to_string(), "sub-7");
        assert_eq!(SubscriptionId(7).value(), 7);
    }
}
