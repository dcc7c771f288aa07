// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcsensor-bin
//!
//! Command line runner for the OPC UA sensor.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │                  main.rs                  │
//! └─────────────────────┬─────────────────────┘
//!                       │
//!                ┌──────▼──────┐
//!                │   cli.rs    │
//!                └──────┬──────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         ▼             ▼             ▼
//!   ┌──────────┐  ┌──────────┐  ┌──────────┐
//!   │ commands │  │  config  │  │ logging  │
//!   └────┬─────┘  └──────────┘  └──────────┘
//!        │
//!   ┌────▼─────────────┐
//!   │ opcsensor-opcua  │
//!   └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Print readings every second (default command)
//! opcsensor -c configs/opcsensor.yaml
//!
//! # One read without a config file
//! opcsensor --endpoint opc.tcp://localhost:4840 --nodeids '["ns=2;i=2"]' read
//!
//! # Write two nodes
//! opcsensor -c configs/opcsensor.yaml write --set 'ns=2;i=3=11' --set 'ns=2;i=2=true'
//!
//! # Validate configuration
//! opcsensor -c configs/opcsensor.yaml validate --format json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands, LogFormat, OutputFormat};
pub use error::{BinError, BinResult};

/// Binary version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name.
pub const NAME: &str = "opcsensor";
