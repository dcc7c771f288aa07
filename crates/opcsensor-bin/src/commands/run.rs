// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.
//!
//! ```text
//! open sensor ─▶ ┌─ tick ─▶ readings ─▶ print ─┐ ─▶ close sensor
//!                └──────────────◀──────────────┘
//!                   until Ctrl-C or --count
//! ```

use opcsensor_core::{Sensor, SensorError};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::read::{print_readings, readings_extra};
use crate::cli::{Cli, RunArgs};
use crate::commands::{close_sensor, open_sensor};
use crate::config;
use crate::error::{BinError, BinResult};

/// Executes the `run` command.
///
/// Read failures are logged and the loop continues; an empty capture is
/// skipped silently.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    if args.interval.is_zero() {
        return Err(BinError::config("--interval must be greater than zero"));
    }

    let config = config::resolve(cli)?;
    let sensor = open_sensor(&config).await?;
    info!(
        sensor = %config.name,
        interval = %humantime::format_duration(args.interval),
        capture = args.capture,
        "Reading until interrupted"
    );

    let result = read_loop(&sensor, &args).await;
    close_sensor(&sensor).await?;
    result
}

async fn read_loop(sensor: &dyn Sensor, args: &RunArgs) -> BinResult<()> {
    let extra = readings_extra(args.capture);
    let mut ticker = interval(args.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut printed: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| BinError::io(e.to_string()).with_context("Failed to listen for Ctrl-C"))?;
                info!("Received Ctrl-C, shutting down");
                return Ok(());
            }
        }

        match sensor.readings(&extra).await {
            Ok(readings) => {
                print_readings(&readings)?;
                printed += 1;
            }
            Err(SensorError::CaptureEmpty) => debug!("No new data this cycle"),
            Err(e @ SensorError::Closed) => return Err(e.into()),
            Err(e) => warn!(error = %e, error_type = e.error_type(), "Readings failed"),
        }

        if args.count.is_some_and(|count| printed >= count) {
            return Ok(());
        }
    }
}
