// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport backed by the `opcua` crate.
//!
//! The client library exposes a blocking API, so every service call runs on
//! the blocking thread pool. A background session loop started on connect
//! processes publish responses and feeds the data-change callbacks, which
//! forward each batch to the monitor through the notification channel.
//!
//! The client reconnects a dropped session on its own, bounded by
//! `session_retry_limit`. Once it gives up the session loop exits and the
//! transport reports [`TransportState::Faulted`].
//!
//! ```text
//! connect ──▶ discover endpoints ──▶ pick (policy, mode) ──▶ activate
//!                                                               │
//!                                         session loop ◀────────┘
//!                                              │ publish responses
//!                                              ▼
//!                                   DataChangeCallback ──▶ NotificationSender
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;

use opcua::client::prelude::{
    AttributeService, Client, ClientBuilder, DataChangeCallback, IdentityToken, MonitoredItem,
    MonitoredItemService, Session, SessionCommand, SubscriptionService,
};
use opcua::crypto::SecurityPolicy;
use opcua::sync::RwLock as SessionLock;
use opcua::types::{
    AttributeId, ExtensionObject, MessageSecurityMode, MonitoredItemCreateRequest, MonitoringMode,
    MonitoringParameters, QualifiedName, ReadValueId, TimestampsToReturn, UAString, Variant,
    WriteValue,
};

use crate::config::{SensorConfig, SubscriptionSettings};
use crate::error::{
    ConnectionError, ConversionError, OpcUaError, OpcUaResult, OperationError, SubscriptionError,
};
use crate::status::StatusCode;
use crate::types::{NodeId, NodeIdentifier, SecurityMode};

use super::transport::{
    ItemNotification, MonitoredItemRequest, MonitoredItemResult, NotificationEvent,
    NotificationSender, OpcUaTransport, OpcUaValue, ReadResult, SubscriptionId, TransportFactory,
    TransportState, WriteResult,
};

type SharedSession = Arc<SessionLock<Session>>;

// =============================================================================
// RealOpcUaTransport
// =============================================================================

/// Transport speaking OPC UA binary over `opc.tcp`.
pub struct RealOpcUaTransport {
    config: SensorConfig,
    state: RwLock<TransportState>,
    session: Mutex<Option<SharedSession>>,
    session_loop: Mutex<Option<oneshot::Sender<SessionCommand>>>,
}

impl RealOpcUaTransport {
    /// Creates an unconnected transport.
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            state: RwLock::new(TransportState::Disconnected),
            session: Mutex::new(None),
            session_loop: Mutex::new(None),
        }
    }

    fn client_builder(&self) -> ClientBuilder {
        // -1 asks the client to reconnect forever
        let retry_limit = self
            .config
            .session_retry_limit
            .map_or(-1, |limit| limit.min(i32::MAX as u32) as i32);
        let retry_interval_ms = self.config.session_retry_interval.as_millis().min(u32::MAX as u128) as u32;

        ClientBuilder::new()
            .application_name(self.config.application_name.as_str())
            .application_uri(format!("urn:{}", self.config.application_name).as_str())
            .session_retry_limit(retry_limit)
            .session_retry_interval(retry_interval_ms)
            .session_timeout(self.config.session_timeout.as_millis() as u32)
            .trust_server_certs(self.config.trust_server_certs)
    }

    fn build_client(&self) -> OpcUaResult<Client> {
        self.client_builder()
            .client()
            .ok_or_else(|| {
                ConnectionError::invalid_endpoint(&self.config.endpoint, "invalid client configuration").into()
            })
    }

    fn security(&self) -> (SecurityPolicy, MessageSecurityMode) {
        match self.config.security_mode {
            SecurityMode::None => (SecurityPolicy::None, MessageSecurityMode::None),
            SecurityMode::Sign => (SecurityPolicy::Basic256Sha256, MessageSecurityMode::Sign),
            SecurityMode::SignAndEncrypt => {
                (SecurityPolicy::Basic256Sha256, MessageSecurityMode::SignAndEncrypt)
            }
        }
    }

    fn session(&self) -> OpcUaResult<SharedSession> {
        self.session.lock().clone().ok_or_else(OpcUaError::not_connected)
    }

    fn set_state(&self, state: TransportState) {
        *self.state.write() = state;
    }

    /// Returns `false` once the session loop has exited on its own.
    fn session_loop_alive(&self) -> bool {
        self.session_loop
            .lock()
            .as_ref()
            .map_or(true, |stop| !stop.is_closed())
    }
}

/// Runs a blocking client call on the blocking pool.
async fn blocking<T, F>(operation: &'static str, f: F) -> OpcUaResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> OpcUaResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        OpcUaError::operation(OperationError::read_failed(
            operation,
            format!("client task failed: {}", e),
        ))
    })?
}

fn status_of(code: opcua::types::StatusCode) -> StatusCode {
    StatusCode(code.bits())
}

// =============================================================================
// Conversions
// =============================================================================

fn to_opcua_node_id(node_id: &NodeId) -> opcua::types::NodeId {
    let ns = node_id.namespace_index;
    match &node_id.identifier {
        NodeIdentifier::Numeric(v) => opcua::types::NodeId::new(ns, *v),
        NodeIdentifier::String(v) => opcua::types::NodeId::new(ns, v.clone()),
        NodeIdentifier::Guid(v) => opcua::types::NodeId::new(ns, opcua::types::Guid::from(*v)),
        NodeIdentifier::Opaque(v) => {
            opcua::types::NodeId::new(ns, opcua::types::ByteString::from(v.as_slice()))
        }
    }
}

fn value_read_id(node_id: &NodeId) -> ReadValueId {
    ReadValueId {
        node_id: to_opcua_node_id(node_id),
        attribute_id: AttributeId::Value as u32,
        index_range: UAString::null(),
        data_encoding: QualifiedName::null(),
    }
}

fn to_chrono(dt: &opcua::types::DateTime) -> DateTime<Utc> {
    dt.as_chrono()
}

fn from_opcua_variant(variant: &Variant) -> OpcUaValue {
    match variant {
        Variant::Empty => OpcUaValue::Null,
        Variant::Boolean(v) => OpcUaValue::Boolean(*v),
        Variant::SByte(v) => OpcUaValue::SByte(*v),
        Variant::Byte(v) => OpcUaValue::Byte(*v),
        Variant::Int16(v) => OpcUaValue::Int16(*v),
        Variant::UInt16(v) => OpcUaValue::UInt16(*v),
        Variant::Int32(v) => OpcUaValue::Int32(*v),
        Variant::UInt32(v) => OpcUaValue::UInt32(*v),
        Variant::Int64(v) => OpcUaValue::Int64(*v),
        Variant::UInt64(v) => OpcUaValue::UInt64(*v),
        Variant::Float(v) => OpcUaValue::Float(*v),
        Variant::Double(v) => OpcUaValue::Double(*v),
        Variant::String(v) => OpcUaValue::String(v.as_ref().to_string()),
        Variant::DateTime(v) => OpcUaValue::DateTime(to_chrono(v)),
        Variant::Guid(v) => OpcUaValue::Guid(uuid::Uuid::from_bytes(*v.as_bytes())),
        Variant::ByteString(v) => OpcUaValue::ByteString(v.value.clone().unwrap_or_default()),
        Variant::Array(array) => {
            OpcUaValue::Array(array.values.iter().map(from_opcua_variant).collect())
        }
        // structures and other built-ins are passed through as text
        other => OpcUaValue::String(format!("{:?}", other)),
    }
}

fn to_opcua_variant(node_id: &NodeId, value: &OpcUaValue) -> OpcUaResult<Variant> {
    let variant = match value {
        OpcUaValue::Null => Variant::Empty,
        OpcUaValue::Boolean(v) => Variant::Boolean(*v),
        OpcUaValue::SByte(v) => Variant::SByte(*v),
        OpcUaValue::Byte(v) => Variant::Byte(*v),
        OpcUaValue::Int16(v) => Variant::Int16(*v),
        OpcUaValue::UInt16(v) => Variant::UInt16(*v),
        OpcUaValue::Int32(v) => Variant::Int32(*v),
        OpcUaValue::UInt32(v) => Variant::UInt32(*v),
        OpcUaValue::Int64(v) => Variant::Int64(*v),
        OpcUaValue::UInt64(v) => Variant::UInt64(*v),
        OpcUaValue::Float(v) => Variant::Float(*v),
        OpcUaValue::Double(v) => Variant::Double(*v),
        OpcUaValue::String(v) => Variant::String(UAString::from(v.as_str())),
        OpcUaValue::DateTime(v) => Variant::DateTime(Box::new(opcua::types::DateTime::from(*v))),
        OpcUaValue::Guid(v) => Variant::Guid(Box::new(opcua::types::Guid::from(*v))),
        OpcUaValue::ByteString(v) => {
            Variant::ByteString(opcua::types::ByteString::from(v.as_slice()))
        }
        OpcUaValue::Array(items) => {
            let variants = items
                .iter()
                .map(|item| to_opcua_variant(node_id, item))
                .collect::<OpcUaResult<Vec<_>>>()?;
            let array = opcua::types::Array::new(opcua::types::VariantTypeId::Variant, variants)
                .map_err(|status| {
                    ConversionError::unencodable(node_id.to_string(), format!("invalid array: {}", status))
                })?;
            Variant::Array(Box::new(array))
        }
    };
    Ok(variant)
}

fn to_notification(item: &MonitoredItem) -> ItemNotification {
    let data_value = item.last_value();
    ItemNotification {
        client_handle: item.client_handle(),
        value: data_value.value.as_ref().map(from_opcua_variant),
        status_code: data_value
            .status
            .map(status_of)
            .unwrap_or(StatusCode::GOOD),
        source_timestamp: data_value.source_timestamp.as_ref().map(to_chrono),
        server_timestamp: data_value.server_timestamp.as_ref().map(to_chrono),
    }
}

// =============================================================================
// OpcUaTransport
// =============================================================================

#[async_trait]
impl OpcUaTransport for RealOpcUaTransport {
    async fn connect(&self) -> OpcUaResult<()> {
        self.set_state(TransportState::Connecting);

        let mut client = match self.build_client() {
            Ok(client) => client,
            Err(e) => {
                self.set_state(TransportState::Faulted);
                return Err(e);
            }
        };
        let endpoint_url = self.config.endpoint.clone();
        let (policy, mode) = self.security();

        let connected = blocking("connect", move || {
            let endpoints = client
                .get_server_endpoints_from_url(endpoint_url.as_str())
                .map_err(|status| ConnectionError::endpoint_not_found(&endpoint_url, status.to_string()))?;

            let endpoint = endpoints
                .into_iter()
                .find(|e| {
                    e.security_policy_uri.as_ref() == policy.to_uri() && e.security_mode == mode
                })
                .ok_or_else(|| ConnectionError::no_suitable_endpoint(format!("{:?}/{:?}", policy, mode)))?;

            tracing::debug!(
                security_policy = %endpoint.security_policy_uri,
                security_mode = ?endpoint.security_mode,
                "Found matching endpoint"
            );

            client
                .connect_to_endpoint(endpoint, IdentityToken::Anonymous)
                .map_err(|status| ConnectionError::refused(&endpoint_url, status.to_string()).into())
        })
        .await;

        let session = match connected {
            Ok(session) => session,
            Err(e) => {
                self.set_state(TransportState::Faulted);
                return Err(e);
            }
        };

        let stop = Session::run_async(session.clone());
        *self.session_loop.lock() = Some(stop);
        *self.session.lock() = Some(session);
        self.set_state(TransportState::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> OpcUaResult<()> {
        self.set_state(TransportState::Disconnected);

        if let Some(stop) = self.session_loop.lock().take() {
            // the loop may already have exited
            let _ = stop.send(SessionCommand::Stop);
        }

        let Some(session) = self.session.lock().take() else {
            return Ok(());
        };

        blocking("disconnect", move || {
            session.write().disconnect();
            Ok(())
        })
        .await
    }

    fn state(&self) -> TransportState {
        let state = *self.state.read();
        if state != TransportState::Connected || self.session_loop_alive() {
            return state;
        }

        let mut current = self.state.write();
        if *current == TransportState::Connected {
            tracing::warn!(
                endpoint = %self.config.endpoint,
                "Session loop exited, reconnect attempts exhausted"
            );
            *current = TransportState::Faulted;
        }
        *current
    }

    async fn read_values(&self, node_ids: &[NodeId], max_age: Duration) -> OpcUaResult<Vec<ReadResult>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        if self.state().is_faulted() {
            return Err(ConnectionError::closed(Some("session loop exited".to_string())).into());
        }

        let session = self.session()?;
        let requests: Vec<ReadValueId> = node_ids.iter().map(value_read_id).collect();
        let max_age_ms = max_age.as_millis() as f64;

        tracing::trace!(count = node_ids.len(), "Reading node values");

        let values = blocking("read", move || {
            session
                .read()
                .read(&requests, TimestampsToReturn::Both, max_age_ms)
                .map_err(|status| OpcUaError::from_read_status(status_of(status)))
        })
        .await?;

        if values.len() != node_ids.len() {
            return Err(OperationError::ResultCountMismatch {
                expected: node_ids.len(),
                actual: values.len(),
            }
            .into());
        }

        Ok(node_ids
            .iter()
            .zip(values.iter())
            .map(|(node_id, data_value)| ReadResult {
                node_id: node_id.clone(),
                value: data_value.value.as_ref().map(from_opcua_variant),
                status_code: data_value.status.map(status_of).unwrap_or(StatusCode::GOOD),
                server_timestamp: data_value.server_timestamp.as_ref().map(to_chrono),
                source_timestamp: data_value.source_timestamp.as_ref().map(to_chrono),
            })
            .collect())
    }

    async fn write_values(&self, writes: &[(NodeId, OpcUaValue)]) -> OpcUaResult<Vec<WriteResult>> {
        if writes.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session()?;
        let requests = writes
            .iter()
            .map(|(node_id, value)| {
                Ok(WriteValue {
                    node_id: to_opcua_node_id(node_id),
                    attribute_id: AttributeId::Value as u32,
                    index_range: UAString::null(),
                    value: opcua::types::DataValue::new_now(to_opcua_variant(node_id, value)?),
                })
            })
            .collect::<OpcUaResult<Vec<_>>>()?;

        tracing::trace!(count = writes.len(), "Writing node values");

        let statuses = blocking("write", move || {
            session.read().write(&requests).map_err(|status| {
                OperationError::write_failed_with_status("batch", "Write request rejected", status_of(status)).into()
            })
        })
        .await?;

        Ok(writes
            .iter()
            .zip(statuses)
            .map(|((node_id, _), status)| WriteResult::new(node_id.clone(), status_of(status)))
            .collect())
    }

    async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
        notifications: NotificationSender,
    ) -> OpcUaResult<SubscriptionId> {
        let session = self.session()?;
        let settings = settings.clone();

        let callback = DataChangeCallback::new(move |items: &[&MonitoredItem]| {
            let batch = items.iter().map(|item| to_notification(item)).collect();
            // the receiver is gone once the monitor has stopped
            let _ = notifications.send(NotificationEvent::DataChange(batch));
        });

        let id = blocking("create_subscription", move || {
            session
                .read()
                .create_subscription(
                    settings.publishing_interval.as_millis() as f64,
                    settings.lifetime_count,
                    settings.keepalive_count,
                    settings.max_notifications_per_publish,
                    settings.priority,
                    true,
                    callback,
                )
                .map_err(|status| SubscriptionError::creation_failed(status.to_string()).into())
        })
        .await?;

        Ok(SubscriptionId(id))
    }

    async fn create_monitored_items(
        &self,
        subscription_id: SubscriptionId,
        items: &[MonitoredItemRequest],
    ) -> OpcUaResult<Vec<MonitoredItemResult>> {
        let session = self.session()?;
        let requests: Vec<MonitoredItemCreateRequest> = items
            .iter()
            .map(|item| MonitoredItemCreateRequest {
                item_to_monitor: value_read_id(&item.node_id),
                monitoring_mode: MonitoringMode::Reporting,
                requested_parameters: MonitoringParameters {
                    client_handle: item.client_handle,
                    sampling_interval: item.sampling_interval.as_millis() as f64,
                    filter: ExtensionObject::null(),
                    queue_size: item.queue_size,
                    discard_oldest: true,
                },
            })
            .collect();
        let handles: Vec<u32> = items.iter().map(|item| item.client_handle).collect();

        let results = blocking("create_monitored_items", move || {
            session
                .read()
                .create_monitored_items(subscription_id.value(), TimestampsToReturn::Both, &requests)
                .map_err(|status| SubscriptionError::monitored_item_failed("batch", status.to_string()).into())
        })
        .await?;

        Ok(handles
            .into_iter()
            .zip(results)
            .map(|(client_handle, result)| MonitoredItemResult {
                client_handle,
                monitored_item_id: result.monitored_item_id,
                status_code: status_of(result.status_code),
            })
            .collect())
    }

    async fn delete_subscription(&self, subscription_id: SubscriptionId) -> OpcUaResult<()> {
        let session = self.session()?;
        blocking("delete_subscription", move || {
            session
                .read()
                .delete_subscription(subscription_id.value())
                .map(|_| ())
                .map_err(|status| {
                    SubscriptionError::DeleteFailed {
                        subscription_id: subscription_id.value(),
                        message: status.to_string(),
                    }
                    .into()
                })
        })
        .await
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl Drop for RealOpcUaTransport {
    fn drop(&mut self) {
        if let Some(stop) = self.session_loop.get_mut().take() {
            let _ = stop.send(SessionCommand::Stop);
        }
    }
}

// =============================================================================
// RealTransportFactory
// =============================================================================

/// Creates a [`RealOpcUaTransport`] per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTransportFactory;

impl TransportFactory for RealTransportFactory {
    fn create(&self, config: &SensorConfig) -> OpcUaResult<Arc<dyn OpcUaTransport>> {
        Ok(Arc::new(RealOpcUaTransport::new(config.clone())))
    }
}
