// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `write` command.

use opcsensor_core::{Command, Sensor};
use opcsensor_opcua::client::WRITE_KEY;
use serde_json::{Map, Value};

use super::read::print_readings;
use crate::cli::{Cli, WriteArgs};
use crate::commands::{close_sensor, open_sensor};
use crate::config;
use crate::error::{BinError, BinResult};

/// Executes the `write` command and prints the per-node results.
pub async fn write(cli: &Cli, args: WriteArgs) -> BinResult<()> {
    let command = build_command(&args)?;
    let config = config::resolve(cli)?;
    let sensor = open_sensor(&config).await?;

    let result = sensor.do_command(&command).await;
    close_sensor(&sensor).await?;

    print_readings(&result?)?;
    Ok(())
}

/// Builds the command object from `--command` or the `--set` pairs.
pub(crate) fn build_command(args: &WriteArgs) -> BinResult<Command> {
    if let Some(raw) = &args.command {
        return match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(command)) => Ok(command),
            Ok(_) => Err(BinError::config("--command must be a JSON object")),
            Err(e) => Err(BinError::config(format!("--command is not valid JSON: {}", e))),
        };
    }

    if args.set.is_empty() {
        return Err(BinError::config("nothing to write, use --set NODE=VALUE or --command"));
    }

    let mut values = Map::new();
    for pair in &args.set {
        let (node, value) = split_assignment(pair)?;
        values.insert(node.to_string(), parse_value(value));
    }

    let mut command = Command::new();
    command.insert(WRITE_KEY.to_string(), Value::Object(values));
    Ok(command)
}

/// Splits `node=value` on the last `=`.
///
/// Node identifiers contain `=` themselves (`ns=2;i=3`), values rarely do.
fn split_assignment(pair: &str) -> BinResult<(&str, &str)> {
    match pair.rsplit_once('=') {
        Some((node, value)) if !node.is_empty() => Ok((node, value)),
        _ => Err(BinError::config(format!("'{}' is not a NODE=VALUE pair", pair))),
    }
}

/// Parses a value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
