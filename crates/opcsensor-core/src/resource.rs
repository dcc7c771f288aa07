// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Sensor resource abstraction.
//!
//! A sensor is a named resource that produces readings on demand, accepts
//! generic commands and can be reconfigured in place.
//!
//! # Lifecycle
//!
//! 1. Create the sensor through a [`SensorFactory`](crate::SensorFactory)
//! 2. Call [`Sensor::readings`] / [`Sensor::do_command`] from any task
//! 3. Call [`Sensor::reconfigure`] whenever the configuration changes
//! 4. Call [`Sensor::close`] once on shutdown

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SensorError, SensorResult};

/// Readings returned by a sensor, keyed by reading name.
pub type Readings = serde_json::Map<String, serde_json::Value>;

/// Extra parameters passed alongside a readings call.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Generic command payload and result.
pub type Command = serde_json::Map<String, serde_json::Value>;

/// Key in [`Extra`] set by capture pipelines.
pub const FROM_DATA_MANAGEMENT: &str = "fromDataManagement";

/// Returns `true` if the readings call comes from a capture pipeline.
///
/// Capture calls consume buffered data destructively and expect
/// [`SensorError::CaptureEmpty`] when nothing new is available.
pub fn is_capture_request(extra: &Extra) -> bool {
    extra
        .get(FROM_DATA_MANAGEMENT)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

// =============================================================================
// Model
// =============================================================================

/// A model triplet such as `viam-soleng:opc-ua:opcsensor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Model {
    /// Organisation namespace.
    pub namespace: String,
    /// Model family.
    pub family: String,
    /// Model name.
    pub name: String,
}

impl Model {
    /// Creates a new model triplet.
    pub fn new(
        namespace: impl Into<String>,
        family: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            family: family.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.family, self.name)
    }
}

impl FromStr for Model {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [namespace, family, name]
                if !namespace.is_empty() && !family.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(*namespace, *family, *name))
            }
            _ => Err(SensorError::config(
                "model",
                format!("'{}' is not a namespace:family:name triplet", s),
            )),
        }
    }
}

impl TryFrom<String> for Model {
    type Error = SensorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.to_string()
    }
}

// =============================================================================
// ResourceConfig
// =============================================================================

/// Configuration envelope for a resource.
///
/// Model-specific settings live in `attributes` and are deserialized by the
/// factory into the model's own config type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource name.
    pub name: String,

    /// Model that implements the resource.
    pub model: Model,

    /// Model-specific attributes.
    #[serde(default = "empty_attributes")]
    pub attributes: serde_json::Value,
}

fn empty_attributes() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ResourceConfig {
    /// Creates a new resource config.
    pub fn new(name: impl Into<String>, model: Model, attributes: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            model,
            attributes,
        }
    }
}

// =============================================================================
// Sensor Trait
// =============================================================================

/// A reconfigurable sensor resource.
///
/// # Thread Safety
///
/// All methods take `&self`; implementations synchronize internally so the
/// host may call them concurrently from multiple tasks.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Returns the resource name.
    fn name(&self) -> String;

    /// Returns the current readings.
    ///
    /// `extra` carries host-specific flags, see [`is_capture_request`].
    async fn readings(&self, extra: &Extra) -> SensorResult<Readings>;

    /// Executes a generic command.
    async fn do_command(&self, command: &Command) -> SensorResult<Command>;

    /// Applies a new configuration in full.
    async fn reconfigure(&self, config: &ResourceConfig) -> SensorResult<()>;

    /// Releases all resources held by the sensor.
    async fn close(&self) -> SensorResult<()>;
}

// =============================================================================
// Tests
// =============================================================================
