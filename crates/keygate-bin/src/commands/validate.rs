// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use keygate_config::{ConfigFormat, KeygateConfig, load_config, render};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Secrets shorter than this are accepted but reported.
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let config = load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!(
                "  Listen: {}:{}",
                config.server.bind_address, config.server.port
            );
            println!("  Token issuer: {}", config.security.token.issuer);
            println!(
                "  Token lifetime: {}s",
                config.security.token.lifetime_secs
            );
            println!(
                "  Admin bootstrap: {}",
                if config.security.allow_admin_bootstrap {
                    "enabled"
                } else {
                    "disabled"
                }
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", render(&config, ConfigFormat::Json)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "bind_address": config.server.bind_address.to_string(),
                    "port": config.server.port,
                    "token_issuer": config.security.token.issuer,
                    "token_lifetime_secs": config.security.token.lifetime_secs,
                    "allow_admin_bootstrap": config.security.allow_admin_bootstrap,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))?;
            println!("{}", text);
        }
        OutputFormat::Toml => {
            println!("# Configuration is valid: {}", config_path.display());
            for warning in &warnings {
                println!("# warning: {}", warning);
            }
            if args.show_config {
                println!("{}", render(&config, ConfigFormat::Toml)?);
            }
        }
    }

    Ok(())
}

/// Reports settings that are valid but likely unintended.
fn collect_warnings(config: &KeygateConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let secret_len = config
        .security
        .token
        .secret
        .as_ref()
        .map_or(0, |secret| secret.expose().len());
    if secret_len < RECOMMENDED_SECRET_LEN {
        warnings.push(format!(
            "Token secret is shorter than {} bytes",
            RECOMMENDED_SECRET_LEN
        ));
    }

    if config.security.allow_admin_bootstrap {
        warnings.push(
            "Admin bootstrap is enabled; the first admin can register without a token"
                .to_string(),
        );
    }

    if config.security.hashing.memory_kib < 8 * 1024 {
        warnings.push("Hashing memory cost is below 8 MiB".to_string());
    }

    warnings
}
