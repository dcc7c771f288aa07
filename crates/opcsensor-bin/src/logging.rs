// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.
//!
//! Logs go to stderr so that readings printed on stdout stay parseable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormat;
use crate::error::{BinError, BinResult};

// =============================================================================
// Logging Initialization
// =============================================================================

/// Initializes the logging subsystem.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Arguments
///
/// * `level` - Log level string (trace, debug, info, warn, error)
/// * `format` - Log output format (text, json, compact)
///
/// # Errors
///
/// Returns an initialization error if the level does not parse or a
/// global subscriber is already installed.
pub fn init_logging(level: &str, format: LogFormat) -> BinResult<()> {
    let filter = build_filter(level)?;

    match format {
        LogFormat::Text => init_text_logging(filter),
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Compact => init_compact_logging(filter),
    }
}

/// Builds the filter from `RUST_LOG` or the given level.
fn build_filter(level: &str) -> BinResult<EnvFilter> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| BinError::init(format!("invalid log level '{}': {}", level, e)))?,
    };

    let directive = "opcua=warn"
        .parse()
        .map_err(|e| BinError::init(format!("invalid log directive: {}", e)))?;
    Ok(filter.add_directive(directive))
}

/// Initializes text-based logging (default).
fn init_text_logging(filter: EnvFilter) -> BinResult<()> {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stderr());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(is_terminal),
        )
        .try_init()
        .map_err(|e| BinError::init(e.to_string()))
}

/// Initializes JSON logging for log aggregation.
fn init_json_logging(filter: EnvFilter) -> BinResult<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| BinError::init(e.to_string()))
}

/// Initializes compact logging.
fn init_compact_logging(filter: EnvFilter) -> BinResult<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| BinError::init(e.to_string()))
}
