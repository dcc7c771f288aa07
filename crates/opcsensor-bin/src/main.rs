// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! opcsensor - OPC UA sensor bridge
//!
//! Main binary entry point.

use opcsensor_bin::error::report_error_and_exit;
use opcsensor_bin::{commands, logging, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = logging::init_logging(&cli.log_level, cli.log_format) {
        report_error_and_exit(e);
    }

    if let Err(e) = commands::execute(cli).await {
        tracing::error!(error = %e, exit_code = e.exit_code(), "Command failed");
        report_error_and_exit(e);
    }
}
