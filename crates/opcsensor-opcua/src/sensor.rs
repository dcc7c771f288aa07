// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The OPC UA sensor resource.
//!
//! [`OpcUaSensor`] implements [`Sensor`] on top of one
//! [`AcquisitionSession`] at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         OpcUaSensor                          │
//! │                                                              │
//! │  readings ──┬── subscribe + capture ──▶ queue.drain()        │
//! │             ├── subscribe           ──▶ queue.snapshot()     │
//! │             └── poll                ──▶ PollingReader        │
//! │                                                              │
//! │  do_command ──────────────────────────▶ execute_write        │
//! │                                                              │
//! │  reconfigure: cancel token ─▶ lock ─▶ close old ─▶ open new  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Locking
//!
//! Readings and commands share a read lock on the session state;
//! reconfiguration and close take the write lock. Before waiting for the
//! write lock, the current session token is cancelled so that reads stuck
//! in the retry loop give the lock up.

use std::sync::Arc;

use async_trait::async_trait;
use opcsensor_core::{
    is_capture_request, Command, Extra, Model, Readings, ResourceConfig, Sensor, SensorError,
    SensorFactory, SensorResult,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::client::{AcquisitionSession, TransportFactory, TransportState};
use crate::config::{AcquisitionMode, SensorConfig};
use crate::error::OpcUaError;
use crate::queue::QueuedReading;
use crate::stats::{SensorStats, StatsSnapshot};

// =============================================================================
// Model
// =============================================================================

/// Model triplet under which the sensor is registered.
pub const MODEL: &str = "viam-soleng:opc-ua:opcsensor";

/// Readings key holding a buffered value.
pub const VALUE_KEY: &str = "value";

/// Readings key holding the node that produced a buffered value.
pub const NODE_ID_KEY: &str = "node_id";

/// Returns [`MODEL`] as a [`Model`].
pub fn model() -> Model {
    Model::new("viam-soleng", "opc-ua", "opcsensor")
}

// =============================================================================
// OpcUaSensor
// =============================================================================

#[derive(Default)]
struct SensorState {
    config: Option<SensorConfig>,
    session: Option<AcquisitionSession>,
    closed: bool,
}

impl SensorState {
    fn session(&self) -> SensorResult<&AcquisitionSession> {
        if self.closed {
            return Err(SensorError::Closed);
        }
        self.session
            .as_ref()
            .ok_or_else(|| SensorError::connection("sensor is not configured"))
    }
}

/// Sensor reading or subscribing to a set of OPC UA nodes.
pub struct OpcUaSensor {
    name: String,
    factory: Arc<dyn TransportFactory>,
    state: RwLock<SensorState>,
    session_cancel: Mutex<CancellationToken>,
    stats: Arc<SensorStats>,
}

impl OpcUaSensor {
    /// Creates an unconfigured sensor.
    ///
    /// Every call fails until [`reconfigure`](Sensor::reconfigure) succeeds.
    pub fn new(name: impl Into<String>, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            name: name.into(),
            factory,
            state: RwLock::new(SensorState::default()),
            session_cancel: Mutex::new(CancellationToken::new()),
            stats: Arc::new(SensorStats::new()),
        }
    }

    /// Creates a sensor and applies `config`.
    ///
    /// # Errors
    ///
    /// - `ConfigValidation` - the attributes are missing or malformed
    /// - `Connection` - the server could not be reached or subscribed to
    pub async fn create(config: &ResourceConfig, factory: Arc<dyn TransportFactory>) -> SensorResult<Self> {
        let sensor = Self::new(config.name.clone(), factory);
        sensor.reconfigure(config).await?;
        Ok(sensor)
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the active acquisition mode, if configured.
    pub async fn mode(&self) -> Option<AcquisitionMode> {
        self.state.read().await.config.as_ref().map(SensorConfig::mode)
    }

    /// Returns the transport state of the active session.
    pub async fn transport_state(&self) -> TransportState {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(AcquisitionSession::state)
            .unwrap_or_default()
    }

    /// Converts an engine error, attributing config errors to this resource.
    fn surface(&self, error: OpcUaError) -> SensorError {
        match SensorError::from(error) {
            SensorError::ConfigValidation { field, message, .. } => SensorError::ConfigValidation {
                path: self.name.clone(),
                field,
                message,
            },
            other => other,
        }
    }

    fn parse_config(&self, config: &ResourceConfig) -> SensorResult<SensorConfig> {
        let parsed = SensorConfig::from_attributes(&config.attributes).map_err(|e| self.surface(e))?;
        parsed.validate().map_err(|e| self.surface(e))?;
        Ok(parsed)
    }

    fn buffered_reading(entry: QueuedReading) -> Readings {
        let mut readings = Readings::new();
        readings.insert(VALUE_KEY.to_string(), entry.value);
        readings.insert(NODE_ID_KEY.to_string(), Value::String(entry.node_id.to_string()));
        readings
    }
}

#[async_trait]
impl Sensor for OpcUaSensor {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn readings(&self, extra: &Extra) -> SensorResult<Readings> {
        let state = self.state.read().await;
        let session = state.session()?;

        match session.mode() {
            AcquisitionMode::Subscribe if is_capture_request(extra) => match session.queue().drain() {
                Some(entry) => Ok(Self::buffered_reading(entry)),
                None => {
                    self.stats.record_capture_empty();
                    tracing::debug!(sensor = %self.name, "No new data to capture");
                    Err(SensorError::CaptureEmpty)
                }
            },
            AcquisitionMode::Subscribe => Ok(session
                .queue()
                .snapshot()
                .map(Self::buffered_reading)
                .unwrap_or_default()),
            AcquisitionMode::Poll => session.read(&self.stats).await.map_err(|e| self.surface(e)),
        }
    }

    async fn do_command(&self, command: &Command) -> SensorResult<Command> {
        let state = self.state.read().await;
        let session = state.session()?;
        session.write(command, &self.stats).await.map_err(|e| self.surface(e))
    }

    async fn reconfigure(&self, config: &ResourceConfig) -> SensorResult<()> {
        let new_config = self.parse_config(config)?;

        self.session_cancel.lock().cancel();
        let mut state = self.state.write().await;
        if state.closed {
            return Err(SensorError::Closed);
        }

        let cancel = CancellationToken::new();
        *self.session_cancel.lock() = cancel.clone();

        if let Some(mut previous) = state.session.take() {
            if let Err(e) = previous.close().await {
                tracing::warn!(sensor = %self.name, error = %e, "Failed to close previous session");
            }
        }
        state.config = Some(new_config.clone());

        let mode = new_config.mode();
        let session = AcquisitionSession::open(new_config, self.factory.as_ref(), cancel, self.stats.clone())
            .await
            .map_err(|e| self.surface(e))?;
        state.session = Some(session);

        tracing::info!(sensor = %self.name, mode = %mode, "Sensor configured");
        Ok(())
    }

    async fn close(&self) -> SensorResult<()> {
        self.session_cancel.lock().cancel();
        let mut state = self.state.write().await;
        if state.closed {
            return Ok(());
        }
        state.closed = true;

        match state.session.take() {
            Some(mut session) => session.close().await.map_err(|e| self.surface(e)),
            None => Ok(()),
        }
    }
}

// =============================================================================
// OpcUaSensorFactory
// =============================================================================

/// Creates [`OpcUaSensor`] resources for a registry.
pub struct OpcUaSensorFactory {
    transport: Arc<dyn TransportFactory>,
}

impl OpcUaSensorFactory {
    /// Creates a factory whose sensors use `transport`.
    pub fn new(transport: Arc<dyn TransportFactory>) -> Self {
        Self { transport }
    }
}

#[cfg(feature = "real-transport")]
impl Default for OpcUaSensorFactory {
    fn default() -> Self {
        Self::new(Arc::new(crate::client::RealTransportFactory))
    }
}

#[async_trait]
impl SensorFactory for OpcUaSensorFactory {
    fn model(&self) -> Model {
        model()
    }

    fn validate(&self, config: &ResourceConfig) -> SensorResult<Vec<String>> {
        let parsed = SensorConfig::from_attributes(&config.attributes)
            .and_then(|parsed| parsed.validate())
            .map_err(SensorError::from);
        match parsed {
            Ok(()) => Ok(Vec::new()),
            Err(SensorError::ConfigValidation { field, message, .. }) => Err(SensorError::ConfigValidation {
                path: config.name.clone(),
                field,
                message,
            }),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, config: &ResourceConfig) -> SensorResult<Box<dyn Sensor>> {
        let sensor = OpcUaSensor::create(config, self.transport.clone()).await?;
        Ok(Box::new(sensor))
    }
}
