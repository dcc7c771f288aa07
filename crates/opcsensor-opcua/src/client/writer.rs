// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Write command translation.
//!
//! `{"write": {"ns=2;i=3": 11, "ns=2;i=2": true}}` becomes one batch write
//! request; the reply is `{"results": ["Good", "BadNotWritable"]}` in the
//! order the entries were submitted.

use opcsensor_core::Command;
use serde_json::Value;

use crate::error::{OpcUaResult, OperationError};
use crate::stats::SensorStats;
use crate::types::NodeId;

use super::conversion::encode_write_value;
use super::transport::{OpcUaTransport, OpcUaValue};

/// Command key holding the node → value map.
pub const WRITE_KEY: &str = "write";

/// Reply key holding the status labels.
pub const RESULTS_KEY: &str = "results";

/// Translates a write command into typed node writes.
///
/// Returns `Ok(None)` when the command carries no `"write"` map, in which
/// case nothing is sent.
///
/// # Errors
///
/// Every entry is validated before the request is sent, so a bad entry
/// aborts the whole batch:
/// - `ConfigurationError::InvalidNodeId` - a key is not a node identifier
/// - `ConversionError` - a value cannot be encoded
pub fn parse_write_command(command: &Command) -> OpcUaResult<Option<Vec<(NodeId, OpcUaValue)>>> {
    let Some(Value::Object(entries)) = command.get(WRITE_KEY) else {
        return Ok(None);
    };

    let writes = entries
        .iter()
        .map(|(node, value)| {
            let node_id: NodeId = node.parse()?;
            let value = encode_write_value(node, value)?;
            Ok((node_id, value))
        })
        .collect::<OpcUaResult<Vec<_>>>()?;

    Ok(Some(writes))
}

/// Executes a write command against `transport`.
///
/// A command without a `"write"` map returns an empty reply.
pub async fn execute_write(
    transport: &dyn OpcUaTransport,
    command: &Command,
    stats: &SensorStats,
) -> OpcUaResult<Command> {
    let Some(writes) = parse_write_command(command)? else {
        tracing::trace!("Command without write map ignored");
        return Ok(Command::new());
    };

    let labels: Vec<Value> = if writes.is_empty() {
        Vec::new()
    } else {
        let results = transport.write_values(&writes).await?;
        if results.len() != writes.len() {
            return Err(OperationError::ResultCountMismatch {
                expected: writes.len(),
                actual: results.len(),
            }
            .into());
        }

        for result in results.iter().filter(|r| !r.is_good()) {
            tracing::debug!(node_id = %result.node_id, status = %result.status_code, "Write rejected");
        }
        results
            .iter()
            .map(|r| Value::String(r.status_code.label()))
            .collect()
    };

    stats.record_write();
    tracing::debug!(nodes = writes.len(), "Write batch completed");

    let mut reply = Command::new();
    reply.insert(RESULTS_KEY.to_string(), Value::Array(labels));
    Ok(reply)
}
