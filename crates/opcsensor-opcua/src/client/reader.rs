// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Poll-mode reads with transient error retry.
//!
//! ```text
//! parse node ids ──▶ read ──ok──▶ warn on non-good ──▶ map by position
//!                     ▲  │
//!                     │  └─err─▶ transient? ──no──▶ return error
//!                     │              │ yes
//!                     └── backoff ◀──┘ (cancellable, optionally capped)
//! ```

use std::sync::Arc;
use std::time::Duration;

use opcsensor_core::Readings;
use tokio_util::sync::CancellationToken;

use crate::config::ReadRetryPolicy;
use crate::error::{OpcUaError, OpcUaResult, OperationError};
use crate::stats::SensorStats;
use crate::types::NodeId;

use super::conversion::option_to_json;
use super::transport::{OpcUaTransport, ReadResult};

/// Reads the configured nodes on demand.
pub struct PollingReader {
    transport: Arc<dyn OpcUaTransport>,
    policy: ReadRetryPolicy,
    max_age: Duration,
}

impl PollingReader {
    /// Creates a reader over a connected transport.
    pub fn new(transport: Arc<dyn OpcUaTransport>, policy: ReadRetryPolicy, max_age: Duration) -> Self {
        Self {
            transport,
            policy,
            max_age,
        }
    }

    /// Reads every node in `nodeids` and keys the values by the configured
    /// identifier strings.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::InvalidNodeId` - a node identifier is malformed
    /// - `OperationError::Cancelled` - `cancel` fired while reading or waiting
    /// - `OperationError::RetriesExhausted` - the attempt cap was reached
    /// - Any non-transient error returned by the transport
    pub async fn read(
        &self,
        nodeids: &[String],
        cancel: &CancellationToken,
        stats: &SensorStats,
    ) -> OpcUaResult<Readings> {
        let node_ids = NodeId::parse_all(nodeids)?;
        let results = self.read_with_retry(&node_ids, cancel, stats).await?;

        if results.len() != node_ids.len() {
            return Err(OperationError::ResultCountMismatch {
                expected: node_ids.len(),
                actual: results.len(),
            }
            .into());
        }

        let mut readings = Readings::new();
        for (key, result) in nodeids.iter().zip(&results) {
            if !result.is_good() {
                tracing::warn!(
                    node_id = %key,
                    status = %result.status_code,
                    "Read returned non-good status"
                );
            }
            readings.insert(key.clone(), option_to_json(result.value.as_ref()));
        }

        stats.record_read();
        Ok(readings)
    }

    async fn read_with_retry(
        &self,
        node_ids: &[NodeId],
        cancel: &CancellationToken,
        stats: &SensorStats,
    ) -> OpcUaResult<Vec<ReadResult>> {
        let mut attempts: u32 = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OpcUaError::cancelled("read")),
                outcome = self.transport.read_values(node_ids, self.max_age) => outcome,
            };

            let error = match outcome {
                Ok(results) => return Ok(results),
                Err(error) => error,
            };
            attempts += 1;

            // a faulted transport has stopped reconnecting
            let state = self.transport.state();
            if state.is_faulted() || !self.policy.is_transient(&error, state.is_closed()) {
                return Err(error);
            }

            if !self.policy.allows_attempt(attempts) {
                return Err(OperationError::RetriesExhausted {
                    attempts,
                    last_error: error.to_string(),
                }
                .into());
            }

            stats.record_read_retry();
            tracing::debug!(
                endpoint = %self.transport.endpoint(),
                attempt = attempts,
                delay_ms = self.policy.backoff.as_millis() as u64,
                error = %error,
                "Transient read error, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(OpcUaError::cancelled("read")),
                _ = tokio::time::sleep(self.policy.backoff) => {}
            }
        }
    }
}
