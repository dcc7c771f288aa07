// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: print readings on an interval until Ctrl-C (default)
//! - `read`: one readings call
//! - `write`: send a write command
//! - `validate`: validate the configuration without connecting
//! - `version`: show version information

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// OPC UA sensor bridge runner.
///
/// Loads a resource configuration from a file, from flags, or both, and
/// drives one OPC UA sensor.
#[derive(Parser, Debug)]
#[command(
    name = "opcsensor",
    author = "Sylvex <contact@sylvex.io>",
    version = opcsensor_opcua::VERSION,
    about = "Reads, subscribes to and writes OPC UA nodes",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Resource configuration file (.json, .yaml, .yml)
    #[arg(short, long, env = "OPCSENSOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Server endpoint, overrides `attributes.endpoint`
    #[arg(long, env = "OPCSENSOR_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Node identifiers as a JSON array, overrides `attributes.nodeids`
    #[arg(long, global = true)]
    pub nodeids: Option<String>,

    /// Subscription mode (`data` to subscribe), overrides `attributes.subscribe`
    #[arg(long, global = true)]
    pub subscribe: Option<String>,

    /// Resource name used when no configuration file is given
    #[arg(long, default_value = "opcsensor", global = true)]
    pub name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "OPCSENSOR_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "OPCSENSOR_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print readings on an interval until interrupted
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Print one set of readings
    Read(ReadArgs),

    /// Write node values
    ///
    /// Values given with `--set` are parsed as JSON and fall back to strings,
    /// so `--set ns=2;i=3=11` writes a number and `--set ns=2;s=Mode=auto`
    /// writes a string.
    Write(WriteArgs),

    /// Validate the configuration without connecting
    Validate(ValidateArgs),

    /// Show version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Time between readings
    #[arg(short, long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Consume buffered values in order, as a capture pipeline does
    #[arg(long)]
    pub capture: bool,

    /// Stop after this many readings
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            capture: false,
            count: None,
        }
    }
}

/// Arguments for the `read` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ReadArgs {
    /// Consume the oldest buffered value instead of peeking at the newest
    #[arg(long)]
    pub capture: bool,
}

/// Arguments for the `write` command.
#[derive(Args, Debug, Default, Clone)]
pub struct WriteArgs {
    /// `node=value` pair, repeatable
    #[arg(short, long = "set", value_name = "NODE=VALUE")]
    pub set: Vec<String>,

    /// Raw command object, e.g. '{"write": {"ns=2;i=3": 11}}'
    #[arg(long, conflicts_with = "set")]
    pub command: Option<String>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }
}

// =============================================================================
// Tests
// =============================================================================
