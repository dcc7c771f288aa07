// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcsensor-core
//!
//! Resource abstractions shared by the OPC UA sensor bridge.
//!
//! This crate is the boundary between the acquisition engine and whatever
//! hosts it (the standalone runner, a robot module, tests):
//!
//! - **Resource**: the [`Sensor`] trait, [`ResourceConfig`] and [`Model`]
//! - **Registry**: explicit [`SensorFactory`] / [`SensorRegistry`] composition
//! - **Error**: the [`SensorError`] hierarchy, including the
//!   [`SensorError::CaptureEmpty`] sentinel
//!
//! ## Example
//!
//! ```rust,ignore
//! use opcsensor_core::{ResourceConfig, SensorRegistry};
//!
//! let mut registry = SensorRegistry::new();
//! registry.register(Box::new(OpcUaSensorFactory::default()));
//!
//! let config: ResourceConfig = serde_json::from_str(raw)?;
//! let sensor = registry.create(&config).await?;
//! let readings = sensor.readings(&Default::default()).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod registry;
pub mod resource;

pub use error::{SensorError, SensorResult};
pub use registry::{SensorFactory, SensorRegistry};
pub use resource::{
    is_capture_request, Command, Extra, Model, Readings, ResourceConfig, Sensor,
    FROM_DATA_MANAGEMENT,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
