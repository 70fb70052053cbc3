// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Errors raised while loading a keygate configuration.

use std::path::PathBuf;
use thiserror::Error;

/// A Result type with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a configuration could not be loaded.
///
/// Field names are dotted paths into [`crate::KeygateConfig`], such as
/// `security.token.secret`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file content does not match the schema.
    #[error("{path}: cannot parse configuration: {message}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A value is present but unacceptable.
    #[error("invalid value for {field}: {message}")]
    Validation {
        /// Dotted field path.
        field: String,
        /// What is wrong with the value.
        message: String,
    },

    /// A required value is absent after overrides are applied.
    #[error("{field} must be set")]
    MissingField {
        /// Dotted field path.
        field: String,
    },

    /// The file exists but could not be read.
    #[error("{path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `${VAR}` placeholder names an unset variable and has no default.
    #[error("placeholder ${{{name}}} is unset and has no default")]
    EnvVarNotFound {
        /// Variable name.
        name: String,
    },

    /// An override variable holds a value of the wrong shape.
    #[error("{name}: {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// Expected shape.
        message: String,
    },

    /// No file at the given path.
    #[error("{path}: no such configuration file")]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// The extension or output format is not handled.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// Offending format.
        format: String,
    },

    /// Parsing or rendering failed outside a file context.
    #[error("cannot (de)serialize configuration: {message}")]
    Serialization {
        /// Serializer message.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing-value error for `field`.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn env_var_not_found(name: impl Into<String>) -> Self {
        Self::EnvVarNotFound { name: name.into() }
    }

    pub(crate) fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub(crate) fn serialization(message: impl ToString) -> Self {
        Self::Serialization {
            message: message.to_string(),
        }
    }

    /// Returns the dotted field path this error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } | Self::MissingField { field } => Some(field),
            _ => None,
        }
    }

    /// Returns `true` if the file itself could not be found or read.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::FileNotFound { .. })
    }
}
