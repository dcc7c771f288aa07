// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: print readings on an interval until interrupted
//! - `read`: print one set of readings
//! - `write`: send a write command
//! - `validate`: validate the resource configuration
//! - `version`: show version information

mod read;
mod run;
mod validate;
mod version;
mod write;

pub use read::read;
pub use run::run;
pub use validate::{validate, ValidationReport};
pub use version::version;
pub use write::write;

use std::sync::Arc;

use opcsensor_core::{ResourceConfig, Sensor, SensorRegistry};
use opcsensor_opcua::{OpcUaSensor, OpcUaSensorFactory, RealTransportFactory};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Read(args) => read::read(&cli, args).await,
        Commands::Write(args) => write::write(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Version => version::version(&cli),
    }
}

/// Returns a registry holding every model this binary serves.
pub fn registry() -> SensorRegistry {
    let mut registry = SensorRegistry::new();
    registry.register(Box::new(OpcUaSensorFactory::default()));
    registry
}

/// Validates `config` and connects a sensor for it.
pub(crate) async fn open_sensor(config: &ResourceConfig) -> BinResult<OpcUaSensor> {
    registry().validate(config)?;

    let sensor = OpcUaSensor::create(config, Arc::new(RealTransportFactory))
        .await
        .map_err(|e| BinError::from(e).with_context(format!("Failed to start sensor '{}'", config.name)))?;
    info!(sensor = %config.name, model = %config.model, "Sensor started");
    Ok(sensor)
}

/// Closes `sensor`, logging its counters.
pub(crate) async fn close_sensor(sensor: &OpcUaSensor) -> BinResult<()> {
    let stats = sensor.stats();
    sensor.close().await?;
    info!(
        sensor = %sensor.name(),
        reads = stats.reads,
        read_retries = stats.read_retries,
        writes = stats.writes,
        notifications = stats.notifications_enqueued,
        "Sensor closed"
    );
    Ok(())
}
