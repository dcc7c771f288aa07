// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA sensor integration tests.
//!
//! Most tests drive the full [`OpcUaSensor`] against a scriptable
//! [`MockTransport`]. Tests marked `#[ignore]` need a real server.
//!
//! # Environment Variables
//!
//! - `OPCUA_TEST_ENDPOINT`: OPC UA server endpoint (default: opc.tcp://localhost:4840)
//! - `OPCUA_TEST_NODE`: readable and writable node (default: ns=2;i=2)
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p opcsensor-opcua --test sensor_integration
//!
//! # Against a simulator
//! OPCUA_TEST_ENDPOINT=opc.tcp://localhost:4840 \
//!     cargo test -p opcsensor-opcua --test sensor_integration -- --ignored
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};

use opcsensor_core::{
    Command, Extra, ResourceConfig, Sensor, SensorError, SensorRegistry, FROM_DATA_MANAGEMENT,
};
use opcsensor_opcua::client::{
    ItemNotification, MonitoredItemRequest, MonitoredItemResult, NotificationEvent,
    NotificationSender, OpcUaTransport, OpcUaValue, ReadResult, SubscriptionId, TransportFactory,
    TransportState, WriteResult,
};
use opcsensor_opcua::{
    model, ConnectionError, NodeId, OpcUaError, OpcUaResult, OpcUaSensor, OpcUaSensorFactory,
    OperationError, SensorConfig, SessionError, StatusCode, SubscriptionSettings,
};

// =============================================================================
// Mock Transport
// =============================================================================

/// Scriptable in-memory transport.
#[derive(Default)]
pub struct MockTransport {
    endpoint: String,
    state: RwLock<TransportState>,
    values: RwLock<HashMap<String, OpcUaValue>>,
    write_statuses: RwLock<HashMap<String, StatusCode>>,
    read_failures: Mutex<VecDeque<OpcUaError>>,
    fail_reads_forever: Mutex<Option<StatusCode>>,
    read_calls: AtomicU32,
    writes: Mutex<Vec<(NodeId, OpcUaValue)>>,
    notifications: Mutex<Option<NotificationSender>>,
    monitored: Mutex<Vec<MonitoredItemRequest>>,
    reject_items: AtomicBool,
    next_subscription_id: AtomicU32,
    events: Mutex<Vec<&'static str>>,
}

impl MockTransport {
    /// Creates a disconnected mock for `endpoint`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            next_subscription_id: AtomicU32::new(1),
            ..Default::default()
        }
    }

    /// Sets the value returned for `node`.
    pub fn set_value(&self, node: &str, value: OpcUaValue) {
        self.values.write().insert(node.to_string(), value);
    }

    /// Sets the status returned when writing `node`.
    pub fn set_write_status(&self, node: &str, status: StatusCode) {
        self.write_statuses.write().insert(node.to_string(), status);
    }

    /// Queues an error for the next read.
    pub fn fail_next_read(&self, error: OpcUaError) {
        self.read_failures.lock().push_back(error);
    }

    /// Makes every read fail with a session invalidation status.
    pub fn fail_reads_forever(&self, status: StatusCode) {
        *self.fail_reads_forever.lock() = Some(status);
    }

    /// Forces the reported connection state.
    pub fn set_state(&self, state: TransportState) {
        *self.state.write() = state;
    }

    /// Returns the number of read requests received.
    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Returns every write received, in order.
    pub fn writes(&self) -> Vec<(NodeId, OpcUaValue)> {
        self.writes.lock().clone()
    }

    /// Returns the lifecycle calls received, in order.
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }

    /// Returns the monitored item requests received.
    pub fn monitored(&self) -> Vec<MonitoredItemRequest> {
        self.monitored.lock().clone()
    }

    /// Pushes a data-change batch of `(client_handle, value)` pairs.
    ///
    /// Returns `false` once the monitor has stopped listening.
    pub fn notify(&self, items: &[(u32, OpcUaValue)]) -> bool {
        let batch = items
            .iter()
            .map(|(handle, value)| ItemNotification::new(*handle, value.clone()))
            .collect();
        self.send(NotificationEvent::DataChange(batch))
    }

    /// Pushes an error event.
    pub fn notify_error(&self, message: &str) -> bool {
        self.send(NotificationEvent::Error(message.to_string()))
    }

    fn send(&self, event: NotificationEvent) -> bool {
        match self.notifications.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn record(&self, event: &'static str) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl OpcUaTransport for MockTransport {
    async fn connect(&self) -> OpcUaResult<()> {
        self.record("connect");
        *self.state.write() = TransportState::Connected;
        Ok(())
    }

    async fn disconnect(&self) -> OpcUaResult<()> {
        self.record("disconnect");
        *self.state.write() = TransportState::Disconnected;
        Ok(())
    }

    fn state(&self) -> TransportState {
        *self.state.read()
    }

    async fn read_values(&self, node_ids: &[NodeId], _max_age: Duration) -> OpcUaResult<Vec<ReadResult>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = *self.fail_reads_forever.lock() {
            return Err(OpcUaError::from_read_status(status));
        }
        if let Some(error) = self.read_failures.lock().pop_front() {
            return Err(error);
        }

        let values = self.values.read();
        Ok(node_ids
            .iter()
            .map(|node_id| match values.get(&node_id.to_string()) {
                Some(value) => ReadResult::success(node_id.clone(), value.clone()),
                None => ReadResult::failure(node_id.clone(), StatusCode::BAD_NODE_ID_UNKNOWN),
            })
            .collect())
    }

    async fn write_values(&self, writes: &[(NodeId, OpcUaValue)]) -> OpcUaResult<Vec<WriteResult>> {
        self.writes.lock().extend(writes.iter().cloned());
        let statuses = self.write_statuses.read();
        Ok(writes
            .iter()
            .map(|(node_id, _)| {
                let status = statuses
                    .get(&node_id.to_string())
                    .copied()
                    .unwrap_or(StatusCode::GOOD);
                WriteResult::new(node_id.clone(), status)
            })
            .collect())
    }

    async fn create_subscription(
        &self,
        _settings: &SubscriptionSettings,
        notifications: NotificationSender,
    ) -> OpcUaResult<SubscriptionId> {
        self.record("create_subscription");
        *self.notifications.lock() = Some(notifications);
        Ok(SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn create_monitored_items(
        &self,
        _subscription_id: SubscriptionId,
        items: &[MonitoredItemRequest],
    ) -> OpcUaResult<Vec<MonitoredItemResult>> {
        self.monitored.lock().extend(items.iter().cloned());
        let status = if self.reject_items.load(Ordering::SeqCst) {
            StatusCode::BAD_NODE_ID_UNKNOWN
        } else {
            StatusCode::GOOD
        };
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| MonitoredItemResult {
                client_handle: item.client_handle,
                monitored_item_id: i as u32 + 100,
                status_code: status,
            })
            .collect())
    }

    async fn delete_subscription(&self, _subscription_id: SubscriptionId) -> OpcUaResult<()> {
        self.record("delete_subscription");
        self.notifications.lock().take();
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Factory handing out a fresh mock per session.
#[derive(Default)]
pub struct MockFactory {
    created: Mutex<Vec<Arc<MockTransport>>>,
    seed: RwLock<HashMap<String, OpcUaValue>>,
    refuse_connections: AtomicBool,
    reject_items: AtomicBool,
}

impl MockFactory {
    fn seed(&self, node: &str, value: OpcUaValue) {
        self.seed.write().insert(node.to_string(), value);
    }

    fn created(&self) -> usize {
        self.created.lock().len()
    }

    fn transport(&self, index: usize) -> Arc<MockTransport> {
        self.created.lock()[index].clone()
    }

    fn latest(&self) -> Arc<MockTransport> {
        self.created.lock().last().cloned().unwrap()
    }
}

impl TransportFactory for MockFactory {
    fn create(&self, config: &SensorConfig) -> OpcUaResult<Arc<dyn OpcUaTransport>> {
        if self.refuse_connections.load(Ordering::SeqCst) {
            return Err(ConnectionError::refused(&config.endpoint, "connection refused").into());
        }
        let transport = Arc::new(MockTransport::new(&config.endpoint));
        for (node, value) in self.seed.read().iter() {
            transport.set_value(node, value.clone());
        }
        transport
            .reject_items
            .store(self.reject_items.load(Ordering::SeqCst), Ordering::SeqCst);
        self.created.lock().push(transport.clone());
        Ok(transport)
    }
}

// =============================================================================
// Helpers
// =============================================================================

const ENDPOINT: &str = "opc.tcp://host:4840";

fn resource(attributes: Value) -> ResourceConfig {
    ResourceConfig::new("plc", model(), attributes)
}

fn poll_config() -> ResourceConfig {
    resource(json!({
        "endpoint": ENDPOINT,
        "nodeids": ["ns=2;i=10", "ns=2;i=11"],
        "subscribe": "",
    }))
}

fn subscribe_config() -> ResourceConfig {
    resource(json!({
        "endpoint": ENDPOINT,
        "nodeids": ["ns=2;i=10", "ns=2;i=11"],
        "subscribe": "data",
    }))
}

fn capture() -> Extra {
    let mut extra = Extra::new();
    extra.insert(FROM_DATA_MANAGEMENT.to_string(), Value::Bool(true));
    extra
}

fn command(value: Value) -> Command {
    value.as_object().cloned().unwrap()
}

async fn sensor_with(config: &ResourceConfig) -> (OpcUaSensor, Arc<MockFactory>) {
    let factory = Arc::new(MockFactory::default());
    let sensor = OpcUaSensor::create(config, factory.clone()).await.unwrap();
    (sensor, factory)
}

/// Waits until the monitor has enqueued `count` notifications.
async fn wait_enqueued(sensor: &OpcUaSensor, count: u64) {
    for _ in 0..200 {
        if sensor.stats().notifications_enqueued >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {} notifications, saw {}",
        count,
        sensor.stats().notifications_enqueued
    );
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_missing_endpoint_fails_without_connecting() {
    let factory = Arc::new(MockFactory::default());
    let config = resource(json!({ "nodeids": ["ns=2;i=10"] }));

    let err = OpcUaSensor::create(&config, factory.clone()).await.err().unwrap();
    match err {
        SensorError::ConfigValidation { path, field, .. } => {
            assert_eq!(path, "plc");
            assert_eq!(field.as_deref(), Some("endpoint"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_subscribe_without_nodes_fails_without_connecting() {
    let factory = Arc::new(MockFactory::default());
    let config = resource(json!({ "endpoint": ENDPOINT, "subscribe": "data" }));

    let err = OpcUaSensor::create(&config, factory.clone()).await.err().unwrap();
    match err {
        SensorError::ConfigValidation { path, message, .. } => {
            assert_eq!(path, "plc");
            assert!(message.contains("nodeids"), "{}", message);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_connection_failure_is_surfaced() {
    let factory = Arc::new(MockFactory::default());
    factory.refuse_connections.store(true, Ordering::SeqCst);

    let err = OpcUaSensor::create(&poll_config(), factory).await.err().unwrap();
    assert!(matches!(err, SensorError::Connection { .. }));
}

#[tokio::test]
async fn test_registry_creates_sensor() {
    let factory = Arc::new(MockFactory::default());
    factory.seed("ns=2;i=10", OpcUaValue::Double(1.5));
    factory.seed("ns=2;i=11", OpcUaValue::Double(2.5));

    let mut registry = SensorRegistry::new();
    registry.register(Box::new(OpcUaSensorFactory::new(factory.clone())));
    assert!(registry.supports(&model()));

    let sensor = registry.create(&poll_config()).await.unwrap();
    assert_eq!(sensor.name(), "plc");
    let readings = sensor.readings(&Extra::new()).await.unwrap();
    assert_eq!(readings["ns=2;i=10"], json!(1.5));
    sensor.close().await.unwrap();
}

// =============================================================================
// Poll Mode
// =============================================================================

#[tokio::test]
async fn test_poll_read_keys_match_configured_nodes() {
    let factory = Arc::new(MockFactory::default());
    factory.seed("ns=2;i=10", OpcUaValue::Double(21.5));
    factory.seed("ns=2;i=11", OpcUaValue::Boolean(true));
    let sensor = OpcUaSensor::create(&poll_config(), factory.clone()).await.unwrap();

    let readings = sensor.readings(&Extra::new()).await.unwrap();
    assert_eq!(
        Value::Object(readings),
        json!({ "ns=2;i=10": 21.5, "ns=2;i=11": true })
    );
    assert_eq!(factory.latest().read_calls(), 1);
    assert_eq!(sensor.stats().reads, 1);
}

#[tokio::test]
async fn test_poll_read_keeps_order_and_bad_results() {
    let factory = Arc::new(MockFactory::default());
    factory.seed("ns=2;i=11", OpcUaValue::Int32(7));
    let config = resource(json!({
        "endpoint": ENDPOINT,
        "nodeids": ["ns=2;i=11", "ns=2;i=10"],
    }));
    let sensor = OpcUaSensor::create(&config, factory).await.unwrap();

    let readings = sensor.readings(&Extra::new()).await.unwrap();
    let keys: Vec<&String> = readings.keys().collect();
    assert_eq!(keys, ["ns=2;i=11", "ns=2;i=10"]);
    assert_eq!(readings["ns=2;i=11"], json!(7));
    assert_eq!(readings["ns=2;i=10"], Value::Null);
}

#[tokio::test]
async fn test_poll_read_capture_flag_is_ignored() {
    let factory = Arc::new(MockFactory::default());
    factory.seed("ns=2;i=10", OpcUaValue::Int32(1));
    factory.seed("ns=2;i=11", OpcUaValue::Int32(2));
    let sensor = OpcUaSensor::create(&poll_config(), factory).await.unwrap();

    let readings = sensor.readings(&capture()).await.unwrap();
    assert_eq!(readings.len(), 2);
}

#[tokio::test]
async fn test_malformed_node_fails_read() {
    let config = resource(json!({
        "endpoint": ENDPOINT,
        "nodeids": ["ns=2;i=10", "not a node"],
    }));
    let (sensor, factory) = sensor_with(&config).await;

    let err = sensor.readings(&Extra::new()).await.unwrap_err();
    match err {
        SensorError::InvalidAddress { address, .. } => assert_eq!(address, "not a node"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(factory.latest().read_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_are_retried_with_backoff() {
    let (sensor, factory) = sensor_with(&poll_config()).await;
    let transport = factory.latest();
    transport.set_value("ns=2;i=10", OpcUaValue::Int32(1));
    transport.set_value("ns=2;i=11", OpcUaValue::Int32(2));
    transport.fail_next_read(SessionError::invalidated(StatusCode::BAD_SESSION_ID_INVALID).into());
    transport.fail_next_read(SessionError::invalidated(StatusCode::BAD_SECURE_CHANNEL_ID_INVALID).into());
    transport.fail_next_read(ConnectionError::closed(None).into());

    let started = tokio::time::Instant::now();
    let readings = sensor.readings(&Extra::new()).await.unwrap();

    assert_eq!(readings["ns=2;i=10"], json!(1));
    assert_eq!(transport.read_calls(), 4);
    assert_eq!(sensor.stats().read_retries, 3);
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_non_transient_error_is_not_retried() {
    let (sensor, factory) = sensor_with(&poll_config()).await;
    let transport = factory.latest();
    transport.fail_next_read(OperationError::read_failed("batch", "BadTooManyOperations").into());

    let err = sensor.readings(&Extra::new()).await.unwrap_err();
    assert!(matches!(err, SensorError::Read { .. }));
    assert_eq!(transport.read_calls(), 1);
    assert_eq!(sensor.stats().read_retries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_faulted_transport_is_not_retried() {
    let (sensor, factory) = sensor_with(&poll_config()).await;
    let transport = factory.latest();
    transport.set_state(TransportState::Faulted);
    transport.fail_reads_forever(StatusCode::BAD_SESSION_ID_INVALID);

    let err = sensor.readings(&Extra::new()).await.unwrap_err();
    assert!(matches!(err, SensorError::Connection { .. }));
    assert_eq!(transport.read_calls(), 1);
    assert_eq!(sensor.stats().read_retries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_retry_cap_ends_read() {
    let config = resource(json!({
        "endpoint": ENDPOINT,
        "nodeids": ["ns=2;i=10"],
        "retry": { "backoff": "250ms", "max_attempts": 3 },
    }));
    let (sensor, factory) = sensor_with(&config).await;
    let transport = factory.latest();
    transport.fail_reads_forever(StatusCode::BAD_SESSION_NOT_ACTIVATED);

    let err = sensor.readings(&Extra::new()).await.unwrap_err();
    match err {
        SensorError::Read { message } => assert!(message.contains("3 attempts"), "{}", message),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(transport.read_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_retry_loop() {
    let (sensor, factory) = sensor_with(&poll_config()).await;
    let transport = factory.latest();
    transport.fail_reads_forever(StatusCode::BAD_SESSION_ID_INVALID);

    let sensor = Arc::new(sensor);
    let reader = tokio::spawn({
        let sensor = sensor.clone();
        async move { sensor.readings(&Extra::new()).await }
    });

    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert!(transport.read_calls() >= 5);

    sensor.close().await.unwrap();
    let result = reader.await.unwrap();
    assert!(matches!(result, Err(SensorError::Read { .. })));
    assert_eq!(transport.state(), TransportState::Disconnected);
}

// =============================================================================
// Subscribe Mode
// =============================================================================

#[tokio::test]
async fn test_monitored_items_use_positional_handles() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let monitored = factory.latest().monitored();

    assert_eq!(monitored.len(), 2);
    assert_eq!(monitored[0].node_id, NodeId::numeric(2, 10));
    assert_eq!(monitored[0].client_handle, 1);
    assert_eq!(monitored[1].node_id, NodeId::numeric(2, 11));
    assert_eq!(monitored[1].client_handle, 2);
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_drain_returns_notifications_in_order() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let transport = factory.latest();

    assert!(transport.notify(&[(1, OpcUaValue::Int32(1))]));
    assert!(transport.notify(&[(1, OpcUaValue::Int32(2)), (2, OpcUaValue::Int32(3))]));
    wait_enqueued(&sensor, 3).await;

    let expected = [(1, "ns=2;i=10"), (2, "ns=2;i=10"), (3, "ns=2;i=11")];
    for (value, node) in expected {
        let readings = sensor.readings(&capture()).await.unwrap();
        assert_eq!(Value::Object(readings), json!({ "value": value, "node_id": node }));
    }

    let err = sensor.readings(&capture()).await.unwrap_err();
    assert!(err.is_capture_empty());
    assert_eq!(sensor.stats().capture_empty, 1);
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_snapshot_returns_latest_without_removing() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let transport = factory.latest();

    let empty = sensor.readings(&Extra::new()).await.unwrap();
    assert!(empty.is_empty());

    transport.notify(&[(1, OpcUaValue::Double(1.0))]);
    transport.notify(&[(2, OpcUaValue::Double(2.0))]);
    wait_enqueued(&sensor, 2).await;

    for _ in 0..3 {
        let readings = sensor.readings(&Extra::new()).await.unwrap();
        assert_eq!(readings["value"], json!(2.0));
        assert_eq!(readings["node_id"], json!("ns=2;i=11"));
    }

    let oldest = sensor.readings(&capture()).await.unwrap();
    assert_eq!(oldest["value"], json!(1.0));
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_notification_error_keeps_monitor_running() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let transport = factory.latest();

    assert!(transport.notify_error("BadDecodingError"));
    assert!(transport.notify(&[(1, OpcUaValue::Boolean(true))]));
    wait_enqueued(&sensor, 1).await;

    let stats = sensor.stats();
    assert_eq!(stats.notification_errors, 1);
    assert_eq!(stats.notifications_enqueued, 1);
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_unknown_handle_is_skipped() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let transport = factory.latest();

    transport.notify(&[(99, OpcUaValue::Int32(5)), (2, OpcUaValue::Int32(6))]);
    wait_enqueued(&sensor, 1).await;

    let readings = sensor.readings(&capture()).await.unwrap();
    assert_eq!(readings["value"], json!(6));
    assert!(sensor.readings(&capture()).await.unwrap_err().is_capture_empty());
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_rejected_items_fail_reconfigure() {
    let factory = Arc::new(MockFactory::default());
    factory.reject_items.store(true, Ordering::SeqCst);

    let err = OpcUaSensor::create(&subscribe_config(), factory.clone()).await.err().unwrap();
    assert!(matches!(err, SensorError::Connection { .. }));
    assert_eq!(
        factory.latest().events(),
        ["connect", "create_subscription", "delete_subscription", "disconnect"]
    );
}

#[tokio::test]
async fn test_close_stops_monitor_before_disconnect() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let transport = factory.latest();

    sensor.close().await.unwrap();
    assert_eq!(
        transport.events(),
        ["connect", "create_subscription", "delete_subscription", "disconnect"]
    );
    assert!(!transport.notify(&[(1, OpcUaValue::Int32(1))]));
    assert_eq!(sensor.stats().notifications_enqueued, 0);

    sensor.close().await.unwrap();
    assert_eq!(transport.events().len(), 4);
    assert!(matches!(
        sensor.readings(&Extra::new()).await,
        Err(SensorError::Closed)
    ));
}

// =============================================================================
// Reconfigure
// =============================================================================

#[tokio::test]
async fn test_reconfigure_replaces_session() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;
    let first = factory.transport(0);
    first.notify(&[(1, OpcUaValue::Int32(1))]);
    wait_enqueued(&sensor, 1).await;

    factory.seed("ns=2;i=10", OpcUaValue::Int32(10));
    factory.seed("ns=2;i=11", OpcUaValue::Int32(11));
    sensor.reconfigure(&poll_config()).await.unwrap();

    assert_eq!(factory.created(), 2);
    assert_eq!(first.state(), TransportState::Disconnected);
    assert!(first.events().contains(&"delete_subscription"));
    assert!(!first.notify(&[(1, OpcUaValue::Int32(2))]));

    let readings = sensor.readings(&capture()).await.unwrap();
    assert_eq!(Value::Object(readings), json!({ "ns=2;i=10": 10, "ns=2;i=11": 11 }));
    assert_eq!(sensor.stats().connections, 2);
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_reconfigure_keeps_current_session() {
    let (sensor, factory) = sensor_with(&poll_config()).await;

    let err = sensor.reconfigure(&resource(json!({}))).await.unwrap_err();
    assert!(matches!(err, SensorError::ConfigValidation { .. }));
    assert_eq!(factory.created(), 1);
    assert_eq!(sensor.transport_state().await, TransportState::Connected);
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_reconfigure_after_close_fails() {
    let (sensor, _factory) = sensor_with(&poll_config()).await;
    sensor.close().await.unwrap();

    let err = sensor.reconfigure(&poll_config()).await.unwrap_err();
    assert!(matches!(err, SensorError::Closed));
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn test_write_reports_status_in_submission_order() {
    let (sensor, factory) = sensor_with(&poll_config()).await;
    let transport = factory.latest();
    transport.set_write_status("ns=2;i=2", StatusCode::BAD_NOT_WRITABLE);

    let reply = sensor
        .do_command(&command(json!({ "write": { "ns=2;i=3": 11, "ns=2;i=2": true } })))
        .await
        .unwrap();

    assert_eq!(Value::Object(reply), json!({ "results": ["Good", "BadNotWritable"] }));
    assert_eq!(
        transport.writes(),
        vec![
            (NodeId::numeric(2, 3), OpcUaValue::Double(11.0)),
            (NodeId::numeric(2, 2), OpcUaValue::Boolean(true)),
        ]
    );
    assert_eq!(sensor.stats().writes, 1);
}

#[tokio::test]
async fn test_write_typed_value() {
    let (sensor, factory) = sensor_with(&subscribe_config()).await;

    let reply = sensor
        .do_command(&command(json!({
            "write": { "ns=2;s=Setpoint": { "type": "Int16", "value": -12 } }
        })))
        .await
        .unwrap();

    assert_eq!(reply["results"], json!(["Good"]));
    assert_eq!(
        factory.latest().writes(),
        vec![(NodeId::string(2, "Setpoint"), OpcUaValue::Int16(-12))]
    );
    sensor.close().await.unwrap();
}

#[tokio::test]
async fn test_bad_node_aborts_write_batch() {
    let (sensor, factory) = sensor_with(&poll_config()).await;

    let err = sensor
        .do_command(&command(json!({ "write": { "ns=2;i=3": 1, "garbage": 2 } })))
        .await
        .unwrap_err();

    match err {
        SensorError::InvalidAddress { address, .. } => assert_eq!(address, "garbage"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(factory.latest().writes().is_empty());
}

#[tokio::test]
async fn test_unencodable_value_aborts_write_batch() {
    let (sensor, factory) = sensor_with(&poll_config()).await;

    let err = sensor
        .do_command(&command(json!({ "write": { "ns=2;i=3": [1, 2] } })))
        .await
        .unwrap_err();

    match err {
        SensorError::UnencodableValue { address, .. } => assert_eq!(address, "ns=2;i=3"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(factory.latest().writes().is_empty());
}

#[tokio::test]
async fn test_commands_without_write_map_are_ignored() {
    let (sensor, factory) = sensor_with(&poll_config()).await;

    for payload in [json!({}), json!({ "read": ["ns=2;i=3"] }), json!({ "write": 5 })] {
        let reply = sensor.do_command(&command(payload)).await.unwrap();
        assert!(reply.is_empty());
    }
    assert!(factory.latest().writes().is_empty());
    assert_eq!(sensor.stats().writes, 0);
}

// =============================================================================
// Real Server Tests (require simulator)
// =============================================================================

#[cfg(feature = "real-transport")]
fn real_config(subscribe: &str) -> ResourceConfig {
    let endpoint = std::env::var("OPCUA_TEST_ENDPOINT")
        .unwrap_or_else(|_| "opc.tcp://localhost:4840".to_string());
    let node = std::env::var("OPCUA_TEST_NODE").unwrap_or_else(|_| "ns=2;i=2".to_string());
    resource(json!({
        "endpoint": endpoint,
        "nodeids": [node],
        "subscribe": subscribe,
        "retry": { "backoff": "500ms", "max_attempts": 5 },
    }))
}

#[cfg(feature = "real-transport")]
#[tokio::test]
#[ignore = "Requires OPC UA simulator"]
async fn test_real_server_poll_read() {
    let factory = Arc::new(opcsensor_opcua::RealTransportFactory);
    let sensor = OpcUaSensor::create(&real_config(""), factory).await.unwrap();

    let readings = sensor.readings(&Extra::new()).await.unwrap();
    assert_eq!(readings.len(), 1);
    sensor.close().await.unwrap();
}

#[cfg(feature = "real-transport")]
#[tokio::test]
#[ignore = "Requires OPC UA simulator"]
async fn test_real_server_subscription() {
    let factory = Arc::new(opcsensor_opcua::RealTransportFactory);
    let sensor = OpcUaSensor::create(&real_config("data"), factory).await.unwrap();

    // the server sends the initial value on item creation
    for _ in 0..50 {
        if sensor.stats().notifications_enqueued > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let readings = sensor.readings(&capture()).await.unwrap();
    assert!(readings.contains_key("value"));
    sensor.close().await.unwrap();
}
