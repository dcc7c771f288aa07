// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Explicit sensor factory registry.
//!
//! Models are registered at composition time instead of through load-time
//! side effects, so several independent registries (and sensors) can coexist
//! in one process.
//!
//! ```rust,ignore
//! let mut registry = SensorRegistry::new();
//! registry.register(Box::new(OpcUaSensorFactory::default()));
//!
//! registry.validate(&config)?;
//! let sensor = registry.create(&config).await?;
//! ```

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::{SensorError, SensorResult};
use crate::resource::{Model, ResourceConfig, Sensor};

// =============================================================================
// Sensor Factory
// =============================================================================

/// A factory for creating sensors of one model.
#[async_trait]
pub trait SensorFactory: Send + Sync {
    /// Returns the model this factory creates sensors for.
    fn model(&self) -> Model;

    /// Validates the configuration without side effects.
    ///
    /// Returns the names of implicit dependencies.
    fn validate(&self, config: &ResourceConfig) -> SensorResult<Vec<String>>;

    /// Creates and configures a new sensor.
    async fn create(&self, config: &ResourceConfig) -> SensorResult<Box<dyn Sensor>>;
}

// =============================================================================
// Sensor Registry
// =============================================================================

/// A registry of sensor factories keyed by model.
pub struct SensorRegistry {
    factories: HashMap<Model, Box<dyn SensorFactory>>,
}

impl SensorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory, replacing any factory for the same model.
    pub fn register(&mut self, factory: Box<dyn SensorFactory>) {
        let model = factory.model();
        tracing::debug!(model = %model, "Registered sensor factory");
        self.factories.insert(model, factory);
    }

    /// Unregisters the factory for a model.
    pub fn unregister(&mut self, model: &Model) -> Option<Box<dyn SensorFactory>> {
        self.factories.remove(model)
    }

    fn factory(&self, model: &Model) -> SensorResult<&dyn SensorFactory> {
        self.factories
            .get(model)
            .map(|f| f.as_ref())
            .ok_or_else(|| SensorError::UnknownModel {
                model: model.to_string(),
            })
    }

    /// Validates a configuration with the factory for its model.
    pub fn validate(&self, config: &ResourceConfig) -> SensorResult<Vec<String>> {
        self.factory(&config.model)?.validate(config)
    }

    /// Validates the configuration and creates a sensor from it.
    ///
    /// # Errors
    ///
    /// - `SensorError::UnknownModel` - No factory registered for the model
    /// - Validation and creation errors from the factory
    pub async fn create(&self, config: &ResourceConfig) -> SensorResult<Box<dyn Sensor>> {
        let factory = self.factory(&config.model)?;
        factory.validate(config)?;
        factory.create(config).await
    }

    /// Returns the registered models.
    pub fn supported_models(&self) -> Vec<Model> {
        self.factories.keys().cloned().collect()
    }

    /// Returns `true` if a factory is registered for the model.
    pub fn supports(&self, model: &Model) -> bool {
        self.factories.contains_key(model)
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("models", &self.supported_models())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
