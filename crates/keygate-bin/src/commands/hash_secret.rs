// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-secret` command.

use std::io::BufRead;

use anyhow::Context;
use keygate_api::CredentialHasher;
use keygate_api::credentials::{MAX_SECRET_LEN, MIN_SECRET_LEN};
use keygate_config::{HashingSettings, load_config};
use tracing::warn;

use crate::cli::{Cli, HashSecretArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::hasher_config_from;

/// Executes the `hash-secret` command and prints the PHC digest.
///
/// Uses the hashing cost from the configuration file when it exists and the
/// defaults otherwise.
pub async fn hash_secret(cli: &Cli, args: HashSecretArgs) -> BinResult<()> {
    let secret = match args.secret {
        Some(secret) if !args.stdin => secret,
        _ => read_secret_from_stdin()?,
    };
    check_length(&secret)?;

    let hashing = if cli.config.exists() {
        load_config(&cli.config)?.security.hashing
    } else {
        warn!(
            config = %cli.config.display(),
            "Configuration file not found, using default hashing cost"
        );
        HashingSettings::default()
    };

    let hasher = CredentialHasher::new(&hasher_config_from(&hashing))
        .map_err(|e| BinError::config(e.to_string()))?;
    let digest = hasher
        .hash(secret)
        .await
        .map_err(|e| BinError::runtime(e.to_string()))?;

    println!("{}", digest);
    Ok(())
}

fn read_secret_from_stdin() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read secret from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn check_length(secret: &str) -> BinResult<()> {
    let len = secret.chars().count();
    if !(MIN_SECRET_LEN..=MAX_SECRET_LEN).contains(&len) {
        return Err(BinError::config(format!(
            "Secret must be between {} and {} characters",
            MIN_SECRET_LEN, MAX_SECRET_LEN
        )));
    }
    Ok(())
}
