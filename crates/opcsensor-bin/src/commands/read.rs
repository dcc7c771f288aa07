// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `read` command.

use std::io::Write;

use anyhow::Context;
use opcsensor_core::{Extra, Readings, Sensor, FROM_DATA_MANAGEMENT};
use serde_json::Value;

use crate::cli::{Cli, ReadArgs};
use crate::commands::{close_sensor, open_sensor};
use crate::config;
use crate::error::BinResult;

/// Executes the `read` command: one readings call printed as JSON.
pub async fn read(cli: &Cli, args: ReadArgs) -> BinResult<()> {
    let config = config::resolve(cli)?;
    let sensor = open_sensor(&config).await?;

    let result = sensor.readings(&readings_extra(args.capture)).await;
    close_sensor(&sensor).await?;

    print_readings(&result?)?;
    Ok(())
}

/// Builds the `extra` map for a readings call.
pub(crate) fn readings_extra(capture: bool) -> Extra {
    let mut extra = Extra::new();
    if capture {
        extra.insert(FROM_DATA_MANAGEMENT.to_string(), Value::Bool(true));
    }
    extra
}

/// Prints readings as one JSON line on stdout.
pub(crate) fn print_readings(readings: &Readings) -> anyhow::Result<()> {
    let line = serde_json::to_string(readings).context("Failed to serialize readings")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).context("Failed to write readings")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcsensor_core::is_capture_request;

    #[test]
    fn test_readings_extra() {
        assert!(is_capture_request(&readings_extra(true)));
        assert!(!is_capture_request(&readings_extra(false)));
        assert!(readings_extra(false).is_empty());
    }
}
