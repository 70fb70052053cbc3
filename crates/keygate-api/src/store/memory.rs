// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory store implementations.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{IdentityStore, ResourceStore, StoreError};
use crate::auth::Role;
use crate::model::{
    Identity, IdentityId, IdentityUpdate, NewIdentity, NewResource, Page, Resource, ResourceId,
    ResourceUpdate,
};

// =============================================================================
// MemoryIdentityStore
// =============================================================================

#[derive(Default)]
struct IdentityTable {
    by_id: BTreeMap<IdentityId, Identity>,
    by_key: HashMap<String, IdentityId>,
}

/// Identity store backed by a single lock.
///
/// Both indexes live under one `RwLock`, so key uniqueness is checked and
/// claimed in the same critical section.
#[derive(Default)]
pub struct MemoryIdentityStore {
    table: RwLock<IdentityTable>,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored identities.
    pub fn len(&self) -> usize {
        self.table.read().by_id.len()
    }

    /// Returns `true` if no identity is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn insert(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut table = self.table.write();

        if table.by_key.contains_key(&new.external_key) {
            return Err(StoreError::DuplicateKey {
                key: new.external_key,
            });
        }

        let now = Utc::now();
        let identity = Identity {
            id: IdentityId::new(),
            display_name: new.display_name,
            external_key: new.external_key,
            secret_digest: new.secret_digest,
            role: new.role,
            created_at: now,
            updated_at: now,
        };

        table
            .by_key
            .insert(identity.external_key.clone(), identity.id);
        table.by_id.insert(identity.id, identity.clone());

        tracing::info!(identity_id = %identity.id, role = %identity.role, "Identity created");
        Ok(identity)
    }

    async fn get(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        Ok(self.table.read().by_id.get(&id).cloned())
    }

    async fn find_by_key(&self, external_key: &str) -> Result<Option<Identity>, StoreError> {
        let table = self.table.read();
        Ok(table
            .by_key
            .get(external_key)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Page<Identity>, StoreError> {
        let table = self.table.read();
        let total = table.by_id.len() as u64;
        let items = table
            .by_id
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn update(
        &self,
        id: IdentityId,
        update: IdentityUpdate,
    ) -> Result<Identity, StoreError> {
        let mut table = self.table.write();
        let table = &mut *table;

        let identity = table
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("identity", id))?;

        if let Some(key) = update.external_key {
            if key != identity.external_key {
                if table.by_key.contains_key(&key) {
                    return Err(StoreError::DuplicateKey { key });
                }
                table.by_key.remove(&identity.external_key);
                table.by_key.insert(key.clone(), id);
                identity.external_key = key;
            }
        }
        if let Some(display_name) = update.display_name {
            identity.display_name = display_name;
        }
        if let Some(digest) = update.secret_digest {
            identity.secret_digest = digest;
        }
        if let Some(role) = update.role {
            identity.role = role;
        }
        identity.updated_at = Utc::now();

        Ok(identity.clone())
    }

    async fn delete(&self, id: IdentityId) -> Result<bool, StoreError> {
        let mut table = self.table.write();
        match table.by_id.remove(&id) {
            Some(identity) => {
                table.by_key.remove(&identity.external_key);
                tracing::info!(identity_id = %id, "Identity deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_with_role(&self, role: Role) -> Result<u64, StoreError> {
        let table = self.table.read();
        Ok(table.by_id.values().filter(|i| i.role == role).count() as u64)
    }
}

// =============================================================================
// MemoryResourceStore
// =============================================================================

/// Resource store backed by a concurrent map.
#[derive(Default)]
pub struct MemoryResourceStore {
    resources: DashMap<ResourceId, Resource>,
}

impl MemoryResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if no resource is stored.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn insert(&self, new: NewResource) -> Result<Resource, StoreError> {
        let now = Utc::now();
        let resource = Resource {
            id: ResourceId::new(),
            title: new.title,
            content: new.content,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        };

        self.resources.insert(resource.id, resource.clone());

        tracing::info!(
            resource_id = %resource.id,
            owner_id = %resource.owner_id,
            "Resource created"
        );
        Ok(resource)
    }

    async fn get(&self, id: ResourceId) -> Result<Option<Resource>, StoreError> {
        Ok(self.resources.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(
        &self,
        owner: Option<IdentityId>,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Resource>, StoreError> {
        let mut matching: Vec<Resource> = self
            .resources
            .iter()
            .filter(|entry| owner.is_none_or(|owner| entry.owner_id == owner))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by_key(|r| r.id);

        Ok(Page::from_sorted(matching, offset, limit))
    }

    async fn update(
        &self,
        id: ResourceId,
        update: ResourceUpdate,
    ) -> Result<Resource, StoreError> {
        let mut entry = self
            .resources
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("resource", id))?;

        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(content) = update.content {
            entry.content = content;
        }
        entry.updated_at = Utc::now();

        Ok(entry.value().clone())
    }

    async fn delete(&self, id: ResourceId) -> Result<bool, StoreError> {
        let removed = self.resources.remove(&id).is_some();
        if removed {
            tracing::info!(resource_id = %id, "Resource deleted");
        }
        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
