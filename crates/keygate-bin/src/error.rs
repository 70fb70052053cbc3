// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the keygate binary.

use thiserror::Error;

/// Result type alias for keygate-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Process exit codes, one per error family.
pub mod exit {
    /// The configuration is missing or invalid.
    pub const CONFIG: i32 = 1;
    /// The process could not start (logging, state assembly).
    pub const STARTUP: i32 = 2;
    /// A failure after startup.
    pub const RUNTIME: i32 = 3;
    /// Terminal or file I/O failed.
    pub const IO: i32 = 4;
    /// The API layer reported an error.
    pub const API: i32 = 5;
}

/// Errors surfaced by the CLI commands.
#[derive(Debug, Error)]
pub enum BinError {
    /// The configuration cannot be used as given.
    #[error("configuration: {0}")]
    Configuration(String),

    /// Startup failed before the server could accept connections.
    #[error("startup: {0}")]
    Initialization(String),

    /// A command failed while running.
    #[error("{0}")]
    Runtime(String),

    /// Terminal or file I/O failed.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// The API layer reported an error.
    #[error(transparent)]
    Api(#[from] keygate_api::ApiError),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] keygate_config::ConfigError),

    /// An error wrapped with what was being attempted.
    #[error("{context}")]
    WithContext {
        /// What was being attempted.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a startup error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Wraps the error with what was being attempted.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => exit::CONFIG,
            Self::Initialization(_) => exit::STARTUP,
            Self::Runtime(_) => exit::RUNTIME,
            Self::Io(_) => exit::IO,
            Self::Api(_) => exit::API,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{:#}", err))
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Writes `error` and each of its causes to stderr, one per line.
pub fn report_error(error: &BinError) {
    eprintln!("keygate: {}", error);

    let mut cause = std::error::Error::source(error);
    while let Some(err) = cause {
        eprintln!("  caused by: {}", err);
        cause = err.source();
    }
}

/// Reports `error` and exits with its code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_source_and_code() {
        let err = BinError::config("secret is not set").with_context("loading keygate.yaml");
        assert_eq!(err.to_string(), "loading keygate.yaml");
        assert_eq!(
            std::error::Error::source(&err).map(|e| e.to_string()),
            Some("configuration: secret is not set".to_string())
        );
        assert_eq!(err.exit_code(), exit::CONFIG);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::init("x").exit_code(), exit::STARTUP);
        assert_eq!(BinError::runtime("x").exit_code(), exit::RUNTIME);
        assert_eq!(
            BinError::from(std::io::Error::other("closed")).exit_code(),
            exit::IO
        );
        assert_eq!(
            BinError::from(keygate_api::ApiError::internal("boom")).exit_code(),
            exit::API
        );
        assert_eq!(
            BinError::from(keygate_config::ConfigError::missing_field("x")).exit_code(),
            exit::CONFIG
        );
    }

    #[test]
    fn test_from_anyhow_keeps_chain() {
        let err = BinError::from(anyhow::anyhow!("stdin closed").context("reading secret"));
        assert_eq!(err.exit_code(), exit::RUNTIME);
        assert_eq!(err.to_string(), "reading secret: stdin closed");
    }
}
