// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity context.

use serde::{Deserialize, Serialize};

use super::Role;
use crate::model::IdentityId;

/// Who is making the request, as proven by a verified token.
///
/// Built once per request by the authentication stage and handed by value to
/// the policy evaluator and then to the handler. It is derived only from the
/// token and never written back to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    /// The authenticated identity.
    pub subject_id: IdentityId,
    /// The role carried by the token.
    pub role: Role,
}

impl IdentityContext {
    /// Creates a new identity context.
    pub fn new(subject_id: IdentityId, role: Role) -> Self {
        Self { subject_id, role }
    }

    /// Returns `true` if this context has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns `true` if the context belongs to `id`.
    pub fn is_subject(&self, id: IdentityId) -> bool {
        self.subject_id == id
    }
}
