// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use opcsensor_core::{ResourceConfig, SensorError};
use opcsensor_opcua::SensorConfig;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::commands::registry;
use crate::config;
use crate::error::{BinError, BinResult};

/// Outcome of validating one resource configuration.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    /// Whether the configuration can be used to start the sensor.
    pub valid: bool,
    /// Resource name.
    pub name: String,
    /// Model triplet.
    pub model: String,
    /// Problem found, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Offending attribute, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Dependencies reported by the factory.
    pub dependencies: Vec<String>,
    /// Parsed settings, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SensorConfig>,
}

impl ValidationReport {
    /// Validates `config` against the registered factories.
    pub fn check(config: &ResourceConfig) -> Self {
        let mut report = Self {
            valid: false,
            name: config.name.clone(),
            model: config.model.to_string(),
            error: None,
            field: None,
            dependencies: Vec::new(),
            settings: None,
        };

        match registry().validate(config) {
            Ok(dependencies) => {
                report.valid = true;
                report.dependencies = dependencies;
                report.settings = SensorConfig::from_attributes(&config.attributes).ok();
            }
            Err(SensorError::ConfigValidation { field, message, .. }) => {
                report.field = field;
                report.error = Some(message);
            }
            Err(e) => report.error = Some(e.to_string()),
        }
        report
    }
}

/// Executes the `validate` command.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = config::resolve(cli)?;
    let report = ValidationReport::check(&config);

    match args.format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => {
            let output = serde_json::to_string_pretty(&report)
                .map_err(|e| BinError::runtime(format!("Failed to serialize report: {}", e)))?;
            println!("{}", output);
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(BinError::config(format!(
            "resource '{}' is invalid: {}",
            report.name,
            report.error.as_deref().unwrap_or("unknown error")
        )))
    }
}

fn print_text(report: &ValidationReport) {
    if !report.valid {
        println!("✗ Configuration is invalid: {}", report.name);
        if let Some(field) = &report.field {
            println!("  Field: {}", field);
        }
        if let Some(error) = &report.error {
            println!("  Error: {}", error);
        }
        return;
    }

    println!("✓ Configuration is valid: {}", report.name);
    println!();
    println!("Summary:");
    println!("  Model: {}", report.model);
    if let Some(settings) = &report.settings {
        println!("  Endpoint: {}", settings.endpoint);
        println!("  Nodes: {}", settings.nodeids.len());
        println!("  Mode: {}", settings.mode());
    }
}
