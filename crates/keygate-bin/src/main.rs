// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

use clap::Parser;
use keygate_bin::error::report_error_and_exit;
use keygate_bin::{Cli, commands, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let started = match init_logging(cli.log.filter(), cli.log.format) {
        Ok(()) => commands::execute(cli).await,
        Err(e) => Err(e),
    };

    if let Err(e) = started {
        report_error_and_exit(e);
    }
}
