// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subcommand implementations.

mod hash_secret;
mod run;
mod validate;
mod version;

pub use hash_secret::hash_secret;
pub use run::run;
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Dispatches to the selected subcommand.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.command() {
        Commands::Run(args) => run(&cli, args).await,
        Commands::Validate(args) => validate(&cli, args),
        Commands::Version => version(),
        Commands::HashSecret(args) => hash_secret(&cli, args).await,
    }
}
