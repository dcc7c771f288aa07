// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Acquisition session lifecycle.
//!
//! One [`AcquisitionSession`] owns everything tied to a single
//! configuration: the transport, the readings queue and, in subscribe mode,
//! the monitor task. Reconfiguration closes the session and opens a new one,
//! so nothing outlives the configuration it was built from.
//!
//! # Close ordering
//!
//! ```text
//! cancel token ──▶ join monitor task ──▶ delete subscription ──▶ disconnect
//! ```
//!
//! The queue is never written after `close` returns.

use std::sync::Arc;

use opcsensor_core::{Command, Readings};
use tokio_util::sync::CancellationToken;

use crate::config::{AcquisitionMode, SensorConfig};
use crate::error::OpcUaResult;
use crate::queue::ReadingsQueue;
use crate::stats::SensorStats;

use super::monitor::{start_monitor, MonitorHandle};
use super::reader::PollingReader;
use super::transport::{OpcUaTransport, TransportFactory, TransportState};
use super::writer::execute_write;

/// A connected session for one configuration.
pub struct AcquisitionSession {
    config: SensorConfig,
    transport: Arc<dyn OpcUaTransport>,
    reader: PollingReader,
    queue: Arc<ReadingsQueue>,
    cancel: CancellationToken,
    monitor: Option<MonitorHandle>,
    closed: bool,
}

impl AcquisitionSession {
    /// Connects and, in subscribe mode, starts the monitor.
    ///
    /// # Errors
    ///
    /// Connection errors are returned as is. If the monitor cannot be
    /// started the connection is closed before returning the error.
    pub async fn open(
        config: SensorConfig,
        factory: &dyn TransportFactory,
        cancel: CancellationToken,
        stats: Arc<SensorStats>,
    ) -> OpcUaResult<Self> {
        let transport = factory.create(&config)?;

        tracing::info!(
            endpoint = %config.endpoint,
            mode = %config.mode(),
            nodes = config.nodeids.len(),
            "Connecting to OPC UA server"
        );
        transport.connect().await?;
        stats.record_connection();
        tracing::info!(endpoint = %config.endpoint, "Connected to OPC UA server");

        let queue = Arc::new(ReadingsQueue::with_capacity(config.queue_capacity));

        let monitor = match config.mode() {
            AcquisitionMode::Poll => None,
            AcquisitionMode::Subscribe => {
                match start_monitor(&transport, &config, queue.clone(), stats, cancel.clone()).await {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        if let Err(close_err) = transport.disconnect().await {
                            close_err.log("disconnect after failed subscribe");
                        }
                        return Err(e);
                    }
                }
            }
        };

        let reader = PollingReader::new(transport.clone(), config.retry.clone(), config.max_age);

        Ok(Self {
            config,
            transport,
            reader,
            queue,
            cancel,
            monitor,
            closed: false,
        })
    }

    /// Returns the configuration of this session.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Returns the acquisition mode.
    pub fn mode(&self) -> AcquisitionMode {
        self.config.mode()
    }

    /// Returns the readings queue.
    pub fn queue(&self) -> &ReadingsQueue {
        &self.queue
    }

    /// Returns the transport state.
    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    /// Reads every configured node.
    pub async fn read(&self, stats: &SensorStats) -> OpcUaResult<Readings> {
        self.reader.read(&self.config.nodeids, &self.cancel, stats).await
    }

    /// Executes a write command.
    pub async fn write(&self, command: &Command, stats: &SensorStats) -> OpcUaResult<Command> {
        execute_write(self.transport.as_ref(), command, stats).await
    }

    /// Closes the session. Closing twice is a no-op.
    ///
    /// The monitor has exited when this returns, even if deleting the
    /// subscription or disconnecting fails.
    pub async fn close(&mut self) -> OpcUaResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cancel.cancel();

        if let Some(monitor) = self.monitor.take() {
            let subscription_id = monitor.subscription_id();
            monitor.join().await;
            if let Err(e) = self.transport.delete_subscription(subscription_id).await {
                e.log("close session");
            }
        }

        let result = self.transport.disconnect().await;
        tracing::info!(endpoint = %self.config.endpoint, "Disconnected from OPC UA server");
        result
    }
}

impl Drop for AcquisitionSession {
    fn drop(&mut self) {
        // stops the monitor task of a session that was never closed
        self.cancel.cancel();
    }
}
