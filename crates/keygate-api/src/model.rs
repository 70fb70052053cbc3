// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Domain records: identities and the resources they own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Identifier of a registered identity.
    IdentityId
);

define_id!(
    /// Identifier of a stored resource.
    ResourceId
);

// =============================================================================
// Identity
// =============================================================================

/// A registered identity as held by the identity store.
///
/// The secret digest never leaves the store layer in responses; handlers
/// convert to [`IdentityView`] before serializing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Identifier.
    pub id: IdentityId,
    /// Human-readable name.
    pub display_name: String,
    /// Unique login key (case-sensitive).
    pub external_key: String,
    /// PHC-formatted hash of the identity's secret.
    pub secret_digest: String,
    /// Assigned role.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Public representation of an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityView {
    /// Identifier.
    pub id: IdentityId,
    /// Human-readable name.
    pub display_name: String,
    /// Unique login key.
    pub external_key: String,
    /// Assigned role.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Identity> for IdentityView {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            display_name: identity.display_name,
            external_key: identity.external_key,
            role: identity.role,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// Fields required to create an identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Human-readable name.
    pub display_name: String,
    /// Unique login key.
    pub external_key: String,
    /// Hash of the secret.
    pub secret_digest: String,
    /// Assigned role.
    pub role: Role,
}

/// Partial update of an identity. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct IdentityUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// New login key.
    pub external_key: Option<String>,
    /// New secret digest.
    pub secret_digest: Option<String>,
    /// New role.
    pub role: Option<Role>,
}

// =============================================================================
// Resource
// =============================================================================

/// A record owned by an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier.
    pub id: ResourceId,
    /// Short title.
    pub title: String,
    /// Free-form body.
    pub content: String,
    /// Identity that created the resource. Immutable after creation.
    pub owner_id: IdentityId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    /// Short title.
    pub title: String,
    /// Free-form body.
    pub content: String,
    /// Creating identity.
    pub owner_id: IdentityId,
}

/// Partial update of a resource. The owner cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdate {
    /// New title.
    pub title: Option<String>,
    /// New content.
    pub content: Option<String>,
}

// =============================================================================
// Page
// =============================================================================

/// A window of a larger ordered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in this window.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Slices an already ordered list into a page.
    pub fn from_sorted(all: Vec<T>, offset: usize, limit: usize) -> Self {
        let total = all.len() as u64;
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self { items, total }
    }

    /// Maps the items of the page.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
