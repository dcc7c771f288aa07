// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription monitor.
//!
//! Creates one subscription with a monitored item per configured node and
//! spawns a task that moves every change notification into the session's
//! [`ReadingsQueue`]. The task stops when the session token is cancelled or
//! the notification stream ends.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SensorConfig;
use crate::error::{ConfigurationError, OpcUaResult, SubscriptionError};
use crate::queue::{QueuedReading, ReadingsQueue};
use crate::stats::SensorStats;
use crate::types::NodeId;

use super::conversion::option_to_json;
use super::transport::{
    MonitoredItemRequest, NotificationEvent, NotificationReceiver, OpcUaTransport, SubscriptionId,
};

/// Handle to a running monitor task.
#[derive(Debug)]
pub struct MonitorHandle {
    subscription_id: SubscriptionId,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Returns the server subscription id.
    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Waits for the task to exit.
    ///
    /// The session token must have been cancelled first.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(subscription = %self.subscription_id, error = %e, "Monitor task failed");
        }
    }
}

/// Subscribes to every node of `config` and starts the monitor task.
///
/// # Errors
///
/// - `ConfigurationError::InvalidNodeId` - a node identifier is malformed
/// - `SubscriptionError` - the server rejected the subscription or items
pub async fn start_monitor(
    transport: &Arc<dyn OpcUaTransport>,
    config: &SensorConfig,
    queue: Arc<ReadingsQueue>,
    stats: Arc<SensorStats>,
    cancel: CancellationToken,
) -> OpcUaResult<MonitorHandle> {
    let node_ids = NodeId::parse_all(&config.nodeids)?;
    if node_ids.is_empty() {
        return Err(ConfigurationError::invalid_value(
            "nodeids",
            "must not be empty in subscribe mode",
        )
        .into());
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let subscription_id = transport.create_subscription(&config.subscription, tx).await?;

    let requests: Vec<MonitoredItemRequest> = node_ids
        .iter()
        .enumerate()
        .map(|(index, node_id)| MonitoredItemRequest {
            node_id: node_id.clone(),
            client_handle: index as u32 + 1,
            sampling_interval: config.sampling_interval,
            queue_size: config.subscription.item_queue_size,
        })
        .collect();

    let results = match transport.create_monitored_items(subscription_id, &requests).await {
        Ok(results) => results,
        Err(e) => {
            if let Err(cleanup) = transport.delete_subscription(subscription_id).await {
                cleanup.log("subscribe cleanup");
            }
            return Err(e);
        }
    };

    let mut handles = HashMap::with_capacity(requests.len());
    for request in requests {
        let status = results
            .iter()
            .find(|r| r.client_handle == request.client_handle)
            .map(|r| r.status_code);
        match status {
            Some(status) if status.is_bad() => {
                tracing::warn!(node_id = %request.node_id, status = %status, "Monitored item rejected");
            }
            _ => {
                handles.insert(request.client_handle, request.node_id);
            }
        }
    }

    if handles.is_empty() {
        if let Err(cleanup) = transport.delete_subscription(subscription_id).await {
            cleanup.log("subscribe cleanup");
        }
        return Err(SubscriptionError::monitored_item_failed(
            "batch",
            "server rejected every monitored item",
        )
        .into());
    }

    tracing::info!(
        endpoint = %transport.endpoint(),
        subscription = %subscription_id,
        items = handles.len(),
        "Subscription created"
    );

    let task = tokio::spawn(run_monitor(rx, handles, queue, stats, cancel));

    Ok(MonitorHandle {
        subscription_id,
        task,
    })
}

async fn run_monitor(
    mut notifications: NotificationReceiver,
    handles: HashMap<u32, NodeId>,
    queue: Arc<ReadingsQueue>,
    stats: Arc<SensorStats>,
    cancel: CancellationToken,
) {
    tracing::debug!(items = handles.len(), "Subscription monitor started");

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = notifications.recv() => event,
        };

        match event {
            Some(NotificationEvent::DataChange(items)) => {
                for item in items {
                    let Some(node_id) = handles.get(&item.client_handle) else {
                        tracing::warn!(client_handle = item.client_handle, "Notification for unknown item");
                        continue;
                    };
                    tracing::trace!(node_id = %node_id, status = %item.status_code, "Data change");
                    queue.push(QueuedReading {
                        node_id: node_id.clone(),
                        value: option_to_json(item.value.as_ref()),
                        source_timestamp: item.source_timestamp,
                        server_timestamp: item.server_timestamp,
                    });
                    stats.record_notification();
                }
            }
            Some(NotificationEvent::Error(message)) => {
                stats.record_notification_error();
                tracing::warn!(error = %message, "Notification error");
            }
            None => {
                tracing::debug!("Notification stream closed");
                break;
            }
        }
    }

    tracing::debug!("Subscription monitor stopped");
}
