// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA acquisition and buffering engine.
//!
//! This crate connects to an OPC UA server, reads or subscribes to a
//! configured list of nodes and exposes them through the
//! [`Sensor`](opcsensor_core::Sensor) resource trait.
//!
//! # Features
//!
//! - Poll mode: on-demand batch reads with a transient-error retry policy
//! - Subscribe mode: monitored items feeding an ordered readings queue,
//!   consumed as a snapshot or drained for capture
//! - Batch writes through `{"write": {...}}` commands
//! - Reconfiguration that tears down the previous session before the next
//!
//! # Error Handling
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Endpoint discovery and session establishment
//! ├── Session       - Session or channel invalidated by the server
//! ├── Operation     - Read/write failures, retries exhausted, cancelled
//! ├── Subscription  - Subscription and monitored item errors
//! ├── Conversion    - Values that cannot be encoded
//! └── Configuration - Invalid attributes and node identifiers
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use opcsensor_core::{Extra, ResourceConfig, Sensor};
//! use opcsensor_opcua::{model, OpcUaSensor, RealTransportFactory};
//!
//! let config = ResourceConfig::new(
//!     "plc",
//!     model(),
//!     serde_json::json!({
//!         "endpoint": "opc.tcp://localhost:4840",
//!         "nodeids": ["ns=2;i=2", "ns=2;i=3"],
//!     }),
//! );
//! let sensor = OpcUaSensor::create(&config, Arc::new(RealTransportFactory)).await?;
//! let readings = sensor.readings(&Extra::new()).await?;
//! sensor.close().await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod queue;
pub mod sensor;
pub mod stats;
pub mod status;
pub mod types;

pub use error::{
    ConfigurationError, ConnectionError, ConversionError, ErrorCode, ErrorSeverity, OpcUaError,
    OpcUaResult, OperationError, SessionError, SubscriptionError,
};

pub use config::{
    AcquisitionMode, ReadRetryPolicy, SensorConfig, SensorConfigBuilder, SubscriptionSettings,
    SUBSCRIBE_DATA,
};

pub use client::{
    AcquisitionSession, ItemNotification, NotificationEvent, NotificationSender, OpcUaTransport,
    OpcUaValue, TransportFactory, TransportState,
};

#[cfg(feature = "real-transport")]
pub use client::{RealOpcUaTransport, RealTransportFactory};

pub use queue::{QueuedReading, ReadingsQueue};
pub use sensor::{model, OpcUaSensor, OpcUaSensorFactory, MODEL, NODE_ID_KEY, VALUE_KEY};
pub use stats::{SensorStats, StatsSnapshot};
pub use status::{status_code_name, StatusCode};
pub use types::{NodeId, NodeIdentifier, OpcUaDataType, SecurityMode};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
