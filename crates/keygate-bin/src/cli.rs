// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Bearer-token authentication and role/ownership authorization API server.
#[derive(Parser, Debug)]
#[command(name = "keygate", version = keygate_api::VERSION, propagate_version = true)]
pub struct Cli {
    /// Configuration file (.yaml, .yml, .toml or .json)
    #[arg(short, long, env = "KEYGATE_CONFIG", default_value = "keygate.yaml", global = true)]
    pub config: PathBuf,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Logging flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Filter directive, e.g. `info` or `keygate_api=debug,info`
    #[arg(short = 'l', long = "log-level", env = "KEYGATE_LOG_LEVEL", default_value = "info", global = true)]
    pub level: String,

    /// Log line format
    #[arg(id = "log_format", long = "log-format", env = "KEYGATE_LOG_FORMAT", default_value = "text", global = true)]
    pub format: LogFormat,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl LogArgs {
    /// Filter after applying `--quiet` and `--verbose`.
    pub fn filter(&self) -> &str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (_, true) => "debug",
            _ => &self.level,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the API (default)
    Run(RunArgs),

    /// Check a configuration file without serving
    Validate(ValidateArgs),

    /// Print component versions
    Version,

    /// Print an Argon2 PHC digest of a secret
    #[command(name = "hash-secret")]
    HashSecret(HashSecretArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Listen on this port instead of the configured one
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Print the loaded configuration with secrets redacted
    #[arg(short, long)]
    pub show_config: bool,

    /// Report format
    #[arg(id = "output_format", short = 'f', long = "format", default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct HashSecretArgs {
    /// Secret to hash
    #[arg(required_unless_present = "stdin")]
    pub secret: Option<String>,

    /// Read the secret from the first line of stdin
    #[arg(long)]
    pub stdin: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// Single-line events without targets
    Compact,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary for humans
    #[default]
    Text,
    /// Machine-readable report
    Json,
    /// Report as TOML comments, config as TOML
    Toml,
}

impl Cli {
    /// The requested subcommand, `run` when none was given.
    pub fn command(&self) -> Commands {
        match &self.command {
            Some(command) => command.clone(),
            None => Commands::Run(RunArgs::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs() {
        let cli = Cli::parse_from(["keygate"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.command(), Commands::Run(RunArgs { port: None })));
        assert_eq!(cli.config, PathBuf::from("keygate.yaml"));
    }

    #[test]
    fn test_run_port_and_config() {
        let cli = Cli::parse_from(["keygate", "run", "-p", "9090", "-c", "/etc/keygate.toml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/keygate.toml"));
        let Commands::Run(args) = cli.command() else {
            panic!("expected run");
        };
        assert_eq!(args.port, Some(9090));
    }

    #[test]
    fn test_validate_flags() {
        let cli = Cli::parse_from(["keygate", "validate", "--show-config", "-f", "toml"]);
        let Commands::Validate(args) = cli.command() else {
            panic!("expected validate");
        };
        assert!(args.show_config);
        assert_eq!(args.format, OutputFormat::Toml);
    }

    #[test]
    fn test_hash_secret_input() {
        let cli = Cli::parse_from(["keygate", "hash-secret", "hunter22"]);
        let Commands::HashSecret(args) = cli.command() else {
            panic!("expected hash-secret");
        };
        assert_eq!(args.secret.as_deref(), Some("hunter22"));

        assert!(Cli::try_parse_from(["keygate", "hash-secret"]).is_err());
        assert!(Cli::try_parse_from(["keygate", "hash-secret", "--stdin"]).is_ok());
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::parse_from(["keygate", "-l", "keygate_api=trace", "--log-format", "json"]);
        assert_eq!(cli.log.filter(), "keygate_api=trace");
        assert_eq!(cli.log.format, LogFormat::Json);

        assert_eq!(Cli::parse_from(["keygate", "-q"]).log.filter(), "warn");
        assert_eq!(Cli::parse_from(["keygate", "version", "-v"]).log.filter(), "debug");
        assert!(Cli::try_parse_from(["keygate", "-q", "-v"]).is_err());
    }
}
