// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Sensor configuration.
//!
//! [`SensorConfig`] is deserialized from the attribute map of a
//! [`ResourceConfig`](opcsensor_core::ResourceConfig). Only `endpoint` is
//! required; everything else has a default matching the behaviour of the
//! deployed module.
//!
//! ```json
//! {
//!   "endpoint": "opc.tcp://0.0.0.0:4840/freeopcua/server/",
//!   "nodeids": ["ns=2;i=2", "ns=2;i=3"],
//!   "subscribe": "data",
//!   "retry": { "backoff": "1s", "max_attempts": 30 }
//! }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, OpcUaError, OpcUaResult};
use crate::status::StatusCode;
use crate::types::SecurityMode;

/// Value of `subscribe` that selects subscription mode.
pub const SUBSCRIBE_DATA: &str = "data";

// =============================================================================
// AcquisitionMode
// =============================================================================

/// How readings are obtained for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AcquisitionMode {
    /// Each readings call issues a read request.
    #[default]
    Poll,

    /// A background monitor buffers change notifications.
    Subscribe,
}

impl AcquisitionMode {
    /// Derives the mode from the `subscribe` attribute.
    pub fn from_subscribe(subscribe: Option<&str>) -> Self {
        match subscribe {
            Some(SUBSCRIBE_DATA) => Self::Subscribe,
            _ => Self::Poll,
        }
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Subscribe => "subscribe",
        }
    }
}

impl std::fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SensorConfig
// =============================================================================

/// Configuration of one OPC UA sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Server endpoint URL (e.g. `opc.tcp://localhost:4840`).
    #[serde(default)]
    pub endpoint: String,

    /// Node identifiers, in the order readings are reported.
    #[serde(default)]
    pub nodeids: Vec<String>,

    /// `"data"` enables subscription mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<String>,

    /// Read retry policy.
    #[serde(default)]
    pub retry: ReadRetryPolicy,

    /// Maximum age of cached server values accepted by a read.
    #[serde(default = "default_max_age", with = "humantime_serde")]
    pub max_age: Duration,

    /// Subscription parameters.
    #[serde(default)]
    pub subscription: SubscriptionSettings,

    /// Sampling interval requested for monitored items.
    ///
    /// Zero asks the server for its fastest rate.
    #[serde(default, with = "humantime_serde")]
    pub sampling_interval: Duration,

    /// Bound on buffered notifications. The oldest entry is dropped when full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,

    /// Message security mode.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Application name announced to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Requested session timeout.
    #[serde(default = "default_session_timeout", with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Accept server certificates without a trust store.
    #[serde(default = "default_true")]
    pub trust_server_certs: bool,

    /// Reconnect attempts after the session drops. Unset retries forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_retry_limit: Option<u32>,

    /// Delay between reconnect attempts.
    #[serde(default = "default_session_retry_interval", with = "humantime_serde")]
    pub session_retry_interval: Duration,
}

fn default_max_age() -> Duration {
    Duration::from_millis(2000)
}

fn default_application_name() -> String {
    "opcsensor".to_string()
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_session_retry_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_true() -> bool {
    true
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            nodeids: Vec::new(),
            subscribe: None,
            retry: ReadRetryPolicy::default(),
            max_age: default_max_age(),
            subscription: SubscriptionSettings::default(),
            sampling_interval: Duration::ZERO,
            queue_capacity: None,
            security_mode: SecurityMode::None,
            application_name: default_application_name(),
            session_timeout: default_session_timeout(),
            trust_server_certs: true,
            session_retry_limit: None,
            session_retry_interval: default_session_retry_interval(),
        }
    }
}

impl SensorConfig {
    /// Creates a builder.
    pub fn builder() -> SensorConfigBuilder {
        SensorConfigBuilder::default()
    }

    /// Deserializes the attribute map of a resource config.
    ///
    /// This does not validate; call [`validate`](Self::validate) afterwards.
    pub fn from_attributes(attributes: &serde_json::Value) -> OpcUaResult<Self> {
        Self::deserialize(attributes).map_err(|e| {
            OpcUaError::configuration(ConfigurationError::Attributes {
                message: e.to_string(),
            })
        })
    }

    /// Returns the acquisition mode.
    pub fn mode(&self) -> AcquisitionMode {
        AcquisitionMode::from_subscribe(self.subscribe.as_deref())
    }

    /// Validates the configuration without touching the network.
    ///
    /// Node identifiers are parsed lazily by the read and monitor paths.
    pub fn validate(&self) -> OpcUaResult<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigurationError::missing_field("endpoint").into());
        }

        if !endpoint.starts_with("opc.tcp://") {
            return Err(ConfigurationError::invalid_endpoint(
                endpoint,
                "Endpoint must start with 'opc.tcp://'",
            )
            .into());
        }

        self.retry.validate()?;

        if self.queue_capacity == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "queue_capacity",
                "must be greater than zero when set",
            )
            .into());
        }

        if self.mode() == AcquisitionMode::Subscribe && self.nodeids.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "nodeids",
                "must not be empty in subscribe mode",
            )
            .into());
        }

        if self.session_retry_interval.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "session_retry_interval",
                "must be greater than zero",
            )
            .into());
        }

        if self.subscription.publishing_interval.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "subscription.publishing_interval",
                "must be greater than zero",
            )
            .into());
        }

        Ok(())
    }
}

// =============================================================================
// SensorConfigBuilder
// =============================================================================

/// Builder for [`SensorConfig`].
#[derive(Debug, Default)]
pub struct SensorConfigBuilder {
    config: SensorConfig,
}

impl SensorConfigBuilder {
    /// Sets the endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Appends a node identifier.
    pub fn node(mut self, node_id: impl Into<String>) -> Self {
        self.config.nodeids.push(node_id.into());
        self
    }

    /// Replaces the node identifiers.
    pub fn nodes<I, S>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.nodeids = node_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Selects the acquisition mode.
    pub fn mode(mut self, mode: AcquisitionMode) -> Self {
        self.config.subscribe = match mode {
            AcquisitionMode::Poll => None,
            AcquisitionMode::Subscribe => Some(SUBSCRIBE_DATA.to_string()),
        };
        self
    }

    /// Sets the read retry policy.
    pub fn retry(mut self, retry: ReadRetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Sets the read max-age hint.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    /// Sets the subscription parameters.
    pub fn subscription(mut self, settings: SubscriptionSettings) -> Self {
        self.config.subscription = settings;
        self
    }

    /// Sets the monitored item sampling interval.
    pub fn sampling_interval(mut self, interval: Duration) -> Self {
        self.config.sampling_interval = interval;
        self
    }

    /// Bounds the readings queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Sets the message security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.config.security_mode = mode;
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// Sets the session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Caps reconnect attempts after the session drops.
    pub fn session_retry_limit(mut self, limit: u32) -> Self {
        self.config.session_retry_limit = Some(limit);
        self
    }

    /// Sets the delay between reconnect attempts.
    pub fn session_retry_interval(mut self, interval: Duration) -> Self {
        self.config.session_retry_interval = interval;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> OpcUaResult<SensorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// ReadRetryPolicy
// =============================================================================

/// Retry policy for poll-mode reads.
///
/// A failed read is retried after `backoff` when the error is transient:
/// an end of stream on a session that was not closed locally, or a service
/// status in `transient_status_codes`. Any other error ends the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRetryPolicy {
    /// Delay between attempts.
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,

    /// Total attempts before giving up. `None` retries until cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Treat an end of stream as transient while the session is open.
    #[serde(default = "default_true")]
    pub retry_on_eof: bool,

    /// Status codes that mark a session or channel the client will recreate.
    #[serde(default = "default_transient_status_codes")]
    pub transient_status_codes: HashSet<StatusCode>,
}

fn default_backoff() -> Duration {
    Duration::from_secs(1)
}

fn default_transient_status_codes() -> HashSet<StatusCode> {
    [
        StatusCode::BAD_SESSION_ID_INVALID,
        StatusCode::BAD_SESSION_NOT_ACTIVATED,
        StatusCode::BAD_SECURE_CHANNEL_ID_INVALID,
    ]
    .into_iter()
    .collect()
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            backoff: default_backoff(),
            max_attempts: None,
            retry_on_eof: true,
            transient_status_codes: default_transient_status_codes(),
        }
    }
}

impl ReadRetryPolicy {
    /// Creates a policy with the given backoff and the default classification.
    pub fn with_backoff(backoff: Duration) -> Self {
        Self {
            backoff,
            ..Default::default()
        }
    }

    /// Caps the number of attempts.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Returns `true` if `error` should be retried.
    ///
    /// `session_closed` is `true` once the session was closed locally; an end
    /// of stream is then final.
    pub fn is_transient(&self, error: &OpcUaError, session_closed: bool) -> bool {
        if error.is_end_of_stream() {
            return self.retry_on_eof && !session_closed;
        }
        error
            .status_code()
            .is_some_and(|code| self.transient_status_codes.contains(&code))
    }

    /// Returns `true` if another attempt is allowed after `attempts` tries.
    pub fn allows_attempt(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    fn validate(&self) -> OpcUaResult<()> {
        if self.backoff.is_zero() {
            return Err(
                ConfigurationError::invalid_value("retry.backoff", "must be greater than zero")
                    .into(),
            );
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "must be at least 1 when set",
            )
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// SubscriptionSettings
// =============================================================================

/// Subscription and monitored item parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// Publishing interval.
    #[serde(default = "default_publishing_interval", with = "humantime_serde")]
    pub publishing_interval: Duration,

    /// Lifetime count (publishing intervals before the subscription expires).
    #[serde(default = "default_lifetime_count")]
    pub lifetime_count: u32,

    /// Max keep-alive count.
    #[serde(default = "default_keepalive_count")]
    pub keepalive_count: u32,

    /// Maximum notifications per publish. Zero means unlimited.
    #[serde(default)]
    pub max_notifications_per_publish: u32,

    /// Priority relative to other subscriptions of the session.
    #[serde(default)]
    pub priority: u8,

    /// Server-side queue size per monitored item.
    #[serde(default = "default_item_queue_size")]
    pub item_queue_size: u32,
}

fn default_publishing_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_lifetime_count() -> u32 {
    60
}

fn default_keepalive_count() -> u32 {
    10
}

fn default_item_queue_size() -> u32 {
    1
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            publishing_interval: default_publishing_interval(),
            lifetime_count: default_lifetime_count(),
            keepalive_count: default_keepalive_count(),
            max_notifications_per_publish: 0,
            priority: 0,
            item_queue_size: default_item_queue_size(),
        }
    }
}

// =============================================================================
// Duration serde
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
