// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential hashing.
//!
//! Secrets are hashed with Argon2id into PHC strings. Hashing is CPU-bound, so
//! every call runs on tokio's blocking pool and holds a permit from a bounded
//! semaphore for its duration.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::error::ApiError;

// =============================================================================
// HashError
// =============================================================================

/// Hashing failures.
#[derive(Debug, Error)]
pub enum HashError {
    /// Cost parameters were rejected by Argon2.
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    /// The stored digest is not a valid PHC string.
    #[error("stored digest is not a valid PHC string: {0}")]
    Digest(String),

    /// Argon2 failed while hashing or verifying.
    #[error("hashing failed: {0}")]
    Hash(String),

    /// The blocking task could not be run to completion.
    #[error("hashing task failed: {0}")]
    Task(String),
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        ApiError::internal(err.to_string())
    }
}

// =============================================================================
// HasherConfig
// =============================================================================

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
    /// Maximum number of hashes computed at the same time.
    pub max_concurrent: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
            max_concurrent: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl HasherConfig {
    /// Smallest parameters Argon2 accepts. Only for tests and tooling.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
            max_concurrent: 4,
        }
    }

    /// Sets the maximum number of concurrent hashes.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    fn params(&self) -> Result<Params, HashError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| HashError::Params(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), HashError> {
        if self.max_concurrent == 0 {
            return Err(HashError::Params(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        self.params().map(|_| ())
    }
}

// =============================================================================
// CredentialHasher
// =============================================================================

/// Hashes and verifies secrets on the blocking pool.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    permits: Arc<Semaphore>,
}

impl CredentialHasher {
    /// Creates a hasher from validated cost parameters.
    pub fn new(config: &HasherConfig) -> Result<Self, HashError> {
        config.validate()?;
        Ok(Self {
            params: config.params()?,
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }

    /// Hashes `secret` with a fresh random salt.
    pub async fn hash(&self, secret: String) -> Result<String, HashError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HashError::Task(e.to_string()))?;
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let salt = SaltString::generate(&mut OsRng);
            Self::argon2(params)
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| HashError::Hash(e.to_string()))
        })
        .await
        .map_err(|e| HashError::Task(e.to_string()))?
    }

    /// Returns whether `secret` matches `digest`.
    ///
    /// The digest carries its own cost parameters, so digests produced under
    /// older settings still verify.
    pub async fn verify(&self, secret: String, digest: String) -> Result<bool, HashError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HashError::Task(e.to_string()))?;
        let params = self.params.clone();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let parsed =
                PasswordHash::new(&digest).map_err(|e| HashError::Digest(e.to_string()))?;
            match Self::argon2(params).verify_password(secret.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(password_hash::Error::Password) => Ok(false),
                Err(e) => Err(HashError::Hash(e.to_string())),
            }
        })
        .await
        .map_err(|e| HashError::Task(e.to_string()))?
    }

    /// Number of hashes that may still start without waiting.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("memory_kib", &self.params.m_cost())
            .field("iterations", &self.params.t_cost())
            .field("parallelism", &self.params.p_cost())
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
