// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Every failure a request can end in is an [`ApiError`]. Each variant maps to
//! one HTTP status and a stable machine-readable code, and renders as
//!
//! ```text
//! {"error": {"code": "FORBIDDEN", "message": "Access denied", "details": ...}}
//! ```
//!
//! Collaborator failures (storage, hashing) are folded into
//! [`ApiError::Internal`], whose message is logged but never sent to callers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AuthError, Denial};

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// A request outcome other than success.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable credential was presented (401).
    #[error("unauthenticated: {message}")]
    Unauthenticated {
        /// What was missing.
        message: String,
    },

    /// A credential was presented but did not verify (401).
    #[error("token rejected: {reason}")]
    InvalidToken {
        /// Why verification failed.
        #[from]
        reason: AuthError,
    },

    /// The access policy denies the operation (403).
    #[error("forbidden: {message}")]
    Forbidden {
        /// The denial, for logs.
        message: String,
    },

    /// The identity or resource does not exist (404).
    #[error("{resource} not found")]
    NotFound {
        /// Kind of record looked up.
        resource: String,
    },

    /// An external key is already registered (400).
    #[error("conflict: {message}")]
    Conflict {
        /// Which key collided.
        message: String,
    },

    /// One or more fields failed validation (400).
    #[error("validation failed: {message}")]
    Validation {
        /// Summary.
        message: String,
        /// Per-field failures, when known.
        #[source]
        errors: Option<ValidationErrors>,
    },

    /// The request body or query could not be decoded (400).
    #[error("bad request: {message}")]
    BadRequest {
        /// Decoder message.
        message: String,
    },

    /// The presented secret does not match the stored digest (400).
    #[error("secret does not match")]
    InvalidCredential,

    /// A collaborator failed (500).
    #[error("internal: {message}")]
    Internal {
        /// Logged, never returned.
        message: String,
    },
}

impl ApiError {
    /// Creates an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Creates an invalid token error.
    pub fn invalid_token(reason: AuthError) -> Self {
        Self::InvalidToken { reason }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not-found error for a kind of record.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a validation error without field detail.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: None,
        }
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status and wire code of this error.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict { .. } => (StatusCode::BAD_REQUEST, "CONFLICT"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidCredential => (StatusCode::BAD_REQUEST, "INVALID_CREDENTIAL"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Returns the HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    /// Returns the machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        self.classify().1
    }

    /// Returns the message sent to callers.
    ///
    /// Denials and internal failures are reduced to generic text so responses
    /// do not reveal policy internals or infrastructure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated { .. } => "Authentication required".to_string(),
            Self::InvalidToken { reason } => format!("Invalid token: {}", reason),
            Self::Forbidden { .. } => "Access denied".to_string(),
            Self::NotFound { resource } => format!("{} not found", resource),
            Self::Conflict { message }
            | Self::Validation { message, .. }
            | Self::BadRequest { message } => message.clone(),
            Self::InvalidCredential => "Invalid credential".to_string(),
            Self::Internal { .. } => "Internal server error".to_string(),
        }
    }

    /// Returns `true` for failures that are the server's fault.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                errors: Some(errors),
                ..
            } => serde_json::to_value(errors).ok(),
            Self::InvalidToken { reason } => Some(serde_json::json!({ "reason": reason.code() })),
            _ => None,
        }
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        Self::forbidden(denial.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        if self.is_server_error() {
            tracing::error!(error = %self, code, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, code, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponseBody {
            error: ErrorDetails {
                code: code.to_string(),
                message: self.user_message(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Top-level error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// The error.
    pub error: ErrorDetails,
}

/// The `error` member of an error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// One of the codes returned by [`ApiError::error_code`].
    pub code: String,
    /// Caller-safe message.
    pub message: String,
    /// Field failures or the token rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Field failures collected while validating one request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationErrors {
    /// Failures in the order they were found.
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns `true` if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `value` if nothing failed, else a [`ApiError::Validation`].
    pub fn into_result<T>(self, value: T) -> ApiResult<T> {
        if self.is_empty() {
            return Ok(value);
        }

        let message = match self.fields.as_slice() {
            [only] => format!("{} {}", only.field, only.message),
            fields => format!("{} fields are invalid", fields.len()),
        };
        Err(ApiError::Validation {
            message,
            errors: Some(self),
        })
    }
}

impl std::error::Error for ValidationErrors {}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|e| e.field.as_str()).collect();
        write!(f, "invalid fields: {}", names.join(", "))
    }
}

/// One field failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Request field name.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

// =============================================================================
// Tests
// =============================================================================
