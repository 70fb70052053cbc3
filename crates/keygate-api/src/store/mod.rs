// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persistence for identities and resources.
//!
//! Handlers and the credential service see storage only through the
//! [`IdentityStore`] and [`ResourceStore`] traits. The in-memory
//! implementations in [`memory`] are the ones the server runs with.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Role;
use crate::error::ApiError;
use crate::model::{
    Identity, IdentityId, IdentityUpdate, NewIdentity, NewResource, Page, Resource, ResourceId,
    ResourceUpdate,
};

pub use memory::{MemoryIdentityStore, MemoryResourceStore};

// =============================================================================
// StoreError
// =============================================================================

/// Storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Another identity already uses this external key.
    #[error("external key '{key}' is already registered")]
    DuplicateKey {
        /// The contested key.
        key: String,
    },

    /// The record does not exist.
    #[error("{entity} {id} does not exist")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The backend failed.
    #[error("storage backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { key } => {
                ApiError::conflict(format!("External key '{}' is already registered", key))
            }
            StoreError::NotFound { entity, .. } => ApiError::not_found(capitalize(entity)),
            StoreError::Backend { message } => ApiError::internal(message),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Durable records of identities.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Inserts a new identity.
    ///
    /// The uniqueness check on the external key and the insert happen
    /// atomically: of two concurrent inserts with the same key exactly one
    /// succeeds.
    async fn insert(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    /// Returns the identity with the given id.
    async fn get(&self, id: IdentityId) -> Result<Option<Identity>, StoreError>;

    /// Returns the identity registered under `external_key` (case-sensitive).
    async fn find_by_key(&self, external_key: &str) -> Result<Option<Identity>, StoreError>;

    /// Returns a page of identities ordered by id.
    async fn list(&self, offset: usize, limit: usize) -> Result<Page<Identity>, StoreError>;

    /// Applies a partial update; a changed external key must stay unique.
    async fn update(&self, id: IdentityId, update: IdentityUpdate)
    -> Result<Identity, StoreError>;

    /// Deletes an identity. Returns `false` if it did not exist.
    async fn delete(&self, id: IdentityId) -> Result<bool, StoreError>;

    /// Returns the number of identities with the given role.
    async fn count_with_role(&self, role: Role) -> Result<u64, StoreError>;

    /// Returns `true` if an identity with the given id exists.
    async fn exists(&self, id: IdentityId) -> Result<bool, StoreError> {
        Ok(self.get(id).await?.is_some())
    }
}

/// Durable records of resources.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Inserts a new resource.
    async fn insert(&self, new: NewResource) -> Result<Resource, StoreError>;

    /// Returns the resource with the given id.
    async fn get(&self, id: ResourceId) -> Result<Option<Resource>, StoreError>;

    /// Returns a page of resources ordered by id, optionally limited to one owner.
    async fn list(
        &self,
        owner: Option<IdentityId>,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Resource>, StoreError>;

    /// Applies a partial update.
    async fn update(&self, id: ResourceId, update: ResourceUpdate)
    -> Result<Resource, StoreError>;

    /// Deletes a resource. Returns `false` if it did not exist.
    async fn delete(&self, id: ResourceId) -> Result<bool, StoreError>;
}
