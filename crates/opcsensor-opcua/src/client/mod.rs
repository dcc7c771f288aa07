// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA client side of the sensor.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     AcquisitionSession                       │
//! │  ┌───────────────┐  ┌───────────────┐  ┌──────────────────┐  │
//! │  │ PollingReader │  │ execute_write │  │  Monitor task    │  │
//! │  │ (retry loop)  │  │ (batch write) │  │ (notifications)  │  │
//! │  └───────┬───────┘  └───────┬───────┘  └────────┬─────────┘  │
//! │          └──────────────────┼───────────────────┘            │
//! │                             ▼                                │
//! │                 Arc<dyn OpcUaTransport>                      │
//! └─────────────────────────────┬────────────────────────────────┘
//!                               ▼
//!                RealOpcUaTransport (`opcua` crate)
//! ```
//!
//! - [`transport`]: the transport trait and wire-level value types
//! - [`conversion`]: value ↔ JSON translation
//! - [`reader`]: poll-mode reads with retry
//! - [`monitor`]: subscription notifications into the readings queue
//! - [`writer`]: write command handling
//! - [`session`]: lifecycle of one configuration

pub mod conversion;
pub mod monitor;
#[cfg(feature = "real-transport")]
pub mod real_transport;
pub mod reader;
pub mod session;
pub mod transport;
pub mod writer;

pub use conversion::{encode_as, encode_write_value, option_to_json, to_json};
pub use monitor::{start_monitor, MonitorHandle};
#[cfg(feature = "real-transport")]
pub use real_transport::{RealOpcUaTransport, RealTransportFactory};
pub use reader::PollingReader;
pub use session::AcquisitionSession;
pub use transport::{
    ItemNotification, MonitoredItemRequest, MonitoredItemResult, NotificationEvent,
    NotificationReceiver, NotificationSender, OpcUaTransport, OpcUaValue, ReadResult,
    SubscriptionId, TransportFactory, TransportState, WriteResult,
};
pub use writer::{execute_write, parse_write_command, RESULTS_KEY, WRITE_KEY};
