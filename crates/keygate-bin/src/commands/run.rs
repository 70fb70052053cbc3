// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// `keygate run`: serves until a shutdown signal arrives.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    tracing::info!(config = %cli.config.display(), port_override = ?args.port, "Loading configuration");

    RuntimeBuilder::new()
        .config_path(&cli.config)
        .port(args.port)
        .build()?
        .run()
        .await
}
