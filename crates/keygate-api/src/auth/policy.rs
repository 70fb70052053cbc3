// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access policy evaluation.
//!
//! Each operation carries a static [`OperationPolicy`] declaring which
//! predicates gate it:
//!
//! - a role predicate: the caller's role must be in a fixed [`RoleSet`]
//! - an ownership predicate: the caller must own the target or be an admin
//!
//! [`evaluate`] applies them in that order and denies on the first failure.
//! All functions here are pure. Looking up the target happens before
//! evaluation, so a missing record surfaces as not-found rather than a denial.

use thiserror::Error;

use super::{IdentityContext, Role};
use crate::model::IdentityId;

// =============================================================================
// RoleSet
// =============================================================================

/// A fixed set of roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet {
    admin: bool,
    standard_user: bool,
}

impl RoleSet {
    /// Only administrators.
    pub const ADMIN_ONLY: RoleSet = RoleSet::of(&[Role::Admin]);

    /// Every role.
    pub const ANY: RoleSet = RoleSet::of(&Role::ALL);

    /// Builds a set from a list of roles.
    pub const fn of(roles: &[Role]) -> Self {
        let mut set = RoleSet {
            admin: false,
            standard_user: false,
        };
        let mut i = 0;
        while i < roles.len() {
            match roles[i] {
                Role::Admin => set.admin = true,
                Role::StandardUser => set.standard_user = true,
            }
            i += 1;
        }
        set
    }

    /// Returns `true` if `role` is a member of the set.
    pub const fn contains(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.admin,
            Role::StandardUser => self.standard_user,
        }
    }
}

// =============================================================================
// OperationPolicy
// =============================================================================

/// Static access descriptor of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
    /// Operation name, used in denials and logs.
    pub name: &'static str,
    /// Roles allowed to invoke the operation. `None` means no role predicate.
    pub roles: Option<RoleSet>,
    /// Whether the caller must own the target (or be an admin).
    pub ownership: bool,
}

impl OperationPolicy {
    /// Any authenticated caller may invoke the operation.
    pub const fn authenticated(name: &'static str) -> Self {
        Self {
            name,
            roles: None,
            ownership: false,
        }
    }

    /// Only callers whose role is in `roles` may invoke the operation.
    pub const fn roles(name: &'static str, roles: RoleSet) -> Self {
        Self {
            name,
            roles: Some(roles),
            ownership: false,
        }
    }

    /// Only the target's owner or an admin may invoke the operation.
    pub const fn owner_or_admin(name: &'static str) -> Self {
        Self {
            name,
            roles: None,
            ownership: true,
        }
    }

    /// Adds a role predicate, keeping any ownership predicate.
    pub const fn with_roles(mut self, roles: RoleSet) -> Self {
        self.roles = Some(roles);
        self
    }
}

/// Policies of every operation exposed over HTTP.
pub mod policies {
    use super::{OperationPolicy, RoleSet};

    /// `GET /users/profile`.
    pub static VIEW_PROFILE: OperationPolicy = OperationPolicy::authenticated("view_profile");
    /// `GET /users`.
    pub static LIST_IDENTITIES: OperationPolicy =
        OperationPolicy::roles("list_identities", RoleSet::ADMIN_ONLY);
    /// `GET /users/{id}`.
    pub static VIEW_IDENTITY: OperationPolicy = OperationPolicy::owner_or_admin("view_identity");
    /// `PUT /users/{id}`.
    pub static UPDATE_IDENTITY: OperationPolicy =
        OperationPolicy::owner_or_admin("update_identity");
    /// `DELETE /users/{id}`.
    pub static DELETE_IDENTITY: OperationPolicy =
        OperationPolicy::roles("delete_identity", RoleSet::ADMIN_ONLY);
    /// Setting or changing the role of any identity.
    pub static ASSIGN_ROLE: OperationPolicy =
        OperationPolicy::roles("assign_role", RoleSet::ADMIN_ONLY);

    /// `POST /resources`.
    pub static CREATE_RESOURCE: OperationPolicy =
        OperationPolicy::authenticated("create_resource");
    /// `GET /resources`.
    pub static LIST_RESOURCES: OperationPolicy = OperationPolicy::authenticated("list_resources");
    /// `GET /resources/{id}`.
    pub static VIEW_RESOURCE: OperationPolicy = OperationPolicy::owner_or_admin("view_resource");
    /// `PUT /resources/{id}`.
    pub static UPDATE_RESOURCE: OperationPolicy =
        OperationPolicy::owner_or_admin("update_resource");
    /// `DELETE /resources/{id}`.
    pub static DELETE_RESOURCE: OperationPolicy =
        OperationPolicy::owner_or_admin("delete_resource");
}

// =============================================================================
// Ownership
// =============================================================================

/// The ownership facts of a looked-up record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipTarget {
    /// Identity recorded as the owner.
    pub owner_id: IdentityId,
    /// Whether that identity still exists.
    pub owner_exists: bool,
}

impl OwnershipTarget {
    /// A record whose owner is known to exist.
    pub fn owned_by(owner_id: IdentityId) -> Self {
        Self {
            owner_id,
            owner_exists: true,
        }
    }

    /// A record whose owner may have been deleted.
    pub fn with_owner_state(owner_id: IdentityId, owner_exists: bool) -> Self {
        Self {
            owner_id,
            owner_exists,
        }
    }
}

// =============================================================================
// Denial
// =============================================================================

/// Why the evaluator denied an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    /// The caller's role is not in the operation's role set.
    #[error("role '{role}' may not perform '{operation}'")]
    Role {
        /// Operation name.
        operation: &'static str,
        /// Caller's role.
        role: Role,
    },
    /// The caller neither owns the target nor is an admin.
    #[error("'{operation}' is limited to the owner or an admin")]
    Ownership {
        /// Operation name.
        operation: &'static str,
    },
}

// =============================================================================
// Predicates
// =============================================================================

/// Returns `true` iff the caller's role is in `allowed`.
pub fn has_any_role(ctx: &IdentityContext, allowed: RoleSet) -> bool {
    allowed.contains(ctx.role)
}

/// Returns `true` iff the caller is an admin or owns the target.
///
/// A target whose owner no longer exists is owned by nobody, so only admins
/// pass.
pub fn is_owner_or_admin(ctx: &IdentityContext, target: &OwnershipTarget) -> bool {
    match ctx.role {
        Role::Admin => true,
        Role::StandardUser => target.owner_exists && target.owner_id == ctx.subject_id,
    }
}

/// Applies the role predicate of `policy`, if it declares one.
pub fn check_role(ctx: &IdentityContext, policy: &OperationPolicy) -> Result<(), Denial> {
    match policy.roles {
        Some(allowed) if !has_any_role(ctx, allowed) => Err(Denial::Role {
            operation: policy.name,
            role: ctx.role,
        }),
        _ => Ok(()),
    }
}

/// Applies the ownership predicate of `policy`, if it declares one.
///
/// An ownership-gated policy without a target denies.
pub fn check_ownership(
    ctx: &IdentityContext,
    policy: &OperationPolicy,
    target: Option<&OwnershipTarget>,
) -> Result<(), Denial> {
    if !policy.ownership {
        return Ok(());
    }

    match target {
        Some(target) if is_owner_or_admin(ctx, target) => Ok(()),
        _ => Err(Denial::Ownership {
            operation: policy.name,
        }),
    }
}

/// Evaluates `policy` for `ctx`: role first, then ownership.
pub fn evaluate(
    ctx: &IdentityContext,
    policy: &OperationPolicy,
    target: Option<&OwnershipTarget>,
) -> Result<(), Denial> {
    check_role(ctx, policy)?;
    check_ownership(ctx, policy, target)
}

// =============================================================================
// Tests
// =============================================================================
