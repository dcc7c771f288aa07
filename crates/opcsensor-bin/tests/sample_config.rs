// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Checks the shipped sample configuration.

use std::path::PathBuf;

use clap::Parser;
use opcsensor_bin::commands::ValidationReport;
use opcsensor_bin::config::{load_resource_config, resolve};
use opcsensor_bin::Cli;
use opcsensor_opcua::{model, AcquisitionMode};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/opcsensor.yaml")
}

#[test]
fn sample_config_is_valid() {
    let config = load_resource_config(&sample_path()).unwrap();
    assert_eq!(config.model, model());

    let report = ValidationReport::check(&config);
    assert!(report.valid, "{:?}", report.error);

    let settings = report.settings.unwrap();
    assert_eq!(settings.mode(), AcquisitionMode::Subscribe);
    assert_eq!(settings.nodeids.len(), 3);
    assert!(settings.retry.max_attempts.is_none());
}

#[test]
fn flags_switch_sample_to_poll_mode() {
    let path = sample_path().to_string_lossy().to_string();
    let cli = Cli::parse_from(["opcsensor", "-c", &path, "--subscribe", "", "validate"]);

    let config = resolve(&cli).unwrap();
    let report = ValidationReport::check(&config);
    assert!(report.valid);
    assert_eq!(report.settings.unwrap().mode(), AcquisitionMode::Poll);
}
