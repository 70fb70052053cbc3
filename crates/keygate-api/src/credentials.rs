// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Registration, login and identity management.
//!
//! [`CredentialService`] orchestrates the hasher, the identity store and the
//! token codec. Every operation that acts on an existing identity takes the
//! caller's [`IdentityContext`] and evaluates the matching policy after the
//! target has been looked up.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::auth::policy::{self, OwnershipTarget};
use crate::auth::{IdentityContext, Role, TokenCodec, policies};
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::hasher::CredentialHasher;
use crate::model::{Identity, IdentityId, IdentityUpdate, NewIdentity, Page};
use crate::store::IdentityStore;

/// Shortest accepted secret, in characters.
pub const MIN_SECRET_LEN: usize = 6;

/// Longest accepted secret, in characters.
pub const MAX_SECRET_LEN: usize = 256;

// =============================================================================
// Inputs and outputs
// =============================================================================

/// A registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Human-readable name.
    pub display_name: String,
    /// Login key.
    pub external_key: String,
    /// Plaintext secret.
    pub secret: String,
    /// Requested role. Defaults to [`Role::StandardUser`].
    pub role: Option<Role>,
}

/// Changes to an existing identity. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    /// New display name.
    pub display_name: Option<String>,
    /// New login key.
    pub external_key: Option<String>,
    /// New plaintext secret.
    pub secret: Option<String>,
    /// New role.
    pub role: Option<Role>,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact token string.
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

// =============================================================================
// CredentialService
// =============================================================================

/// Credential flow over the hasher, the identity store and the codec.
#[derive(Clone)]
pub struct CredentialService {
    identities: Arc<dyn IdentityStore>,
    hasher: CredentialHasher,
    codec: Arc<TokenCodec>,
    allow_admin_bootstrap: bool,
    bootstrap_lock: Arc<Mutex<()>>,
}

impl CredentialService {
    /// Creates a new service. Admin bootstrap is enabled.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        hasher: CredentialHasher,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            identities,
            hasher,
            codec,
            allow_admin_bootstrap: true,
            bootstrap_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Enables or disables self-registration of the first admin.
    pub fn with_admin_bootstrap(mut self, allow: bool) -> Self {
        self.allow_admin_bootstrap = allow;
        self
    }

    /// Returns the hasher.
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Registers a new identity.
    ///
    /// Requesting [`Role::Admin`] needs an admin `caller`, unless no admin
    /// exists yet and bootstrap is enabled. Concurrent bootstrap attempts are
    /// serialized so at most one succeeds.
    pub async fn register(
        &self,
        registration: Registration,
        caller: Option<IdentityContext>,
    ) -> ApiResult<Identity> {
        validate_registration(&registration)?;

        let role = registration.role.unwrap_or_default();
        let bootstrap = match (role, caller) {
            (Role::StandardUser, _) => None,
            (Role::Admin, Some(ctx)) if ctx.is_admin() => None,
            (Role::Admin, caller) => Some(self.admit_bootstrap(caller).await?),
        };

        if self
            .identities
            .find_by_key(&registration.external_key)
            .await?
            .is_some()
        {
            return Err(duplicate_key(&registration.external_key));
        }

        let secret_digest = self.hasher.hash(registration.secret).await?;

        let identity = self
            .identities
            .insert(NewIdentity {
                display_name: registration.display_name,
                external_key: registration.external_key,
                secret_digest,
                role,
            })
            .await?;

        if bootstrap.is_some() {
            tracing::warn!(identity_id = %identity.id, "Bootstrap admin registered");
        }

        Ok(identity)
    }

    /// Holds the bootstrap lock if no admin exists yet.
    async fn admit_bootstrap(
        &self,
        caller: Option<IdentityContext>,
    ) -> ApiResult<OwnedMutexGuard<()>> {
        if self.allow_admin_bootstrap {
            let guard = self.bootstrap_lock.clone().lock_owned().await;
            if self.identities.count_with_role(Role::Admin).await? == 0 {
                return Ok(guard);
            }
        }

        tracing::warn!(
            caller_id = ?caller.map(|ctx| ctx.subject_id),
            "Admin role requested without admin caller"
        );
        if let Some(ctx) = caller {
            policy::evaluate(&ctx, &policies::ASSIGN_ROLE, None)?;
        }
        Err(ApiError::forbidden("Assigning the admin role requires an admin"))
    }

    /// Verifies a key and secret and issues a token.
    pub async fn login(&self, external_key: &str, secret: &str) -> ApiResult<IssuedToken> {
        let identity = self
            .identities
            .find_by_key(external_key)
            .await?
            .ok_or_else(|| ApiError::not_found("Identity"))?;

        let matches = self
            .hasher
            .verify(secret.to_string(), identity.secret_digest.clone())
            .await?;
        if !matches {
            tracing::debug!(identity_id = %identity.id, "Secret mismatch");
            return Err(ApiError::InvalidCredential);
        }

        let token = self.codec.issue(identity.id, identity.role, Utc::now())?;

        tracing::info!(identity_id = %identity.id, "Identity logged in");

        Ok(IssuedToken {
            token,
            expires_in: self.codec.lifetime_secs(),
        })
    }

    // =========================================================================
    // Identity management
    // =========================================================================

    /// Returns the caller's own identity.
    pub async fn profile(&self, ctx: &IdentityContext) -> ApiResult<Identity> {
        policy::evaluate(ctx, &policies::VIEW_PROFILE, None)?;
        self.load(ctx.subject_id).await
    }

    /// Lists identities.
    pub async fn list(
        &self,
        ctx: &IdentityContext,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Page<Identity>> {
        policy::evaluate(ctx, &policies::LIST_IDENTITIES, None)?;
        Ok(self.identities.list(offset, limit).await?)
    }

    /// Returns one identity, visible to itself and to admins.
    pub async fn get(&self, ctx: &IdentityContext, id: IdentityId) -> ApiResult<Identity> {
        let identity = self.load(id).await?;
        policy::evaluate(
            ctx,
            &policies::VIEW_IDENTITY,
            Some(&OwnershipTarget::owned_by(identity.id)),
        )?;
        Ok(identity)
    }

    /// Applies `changes` to identity `id`.
    ///
    /// Changing the role to a different value needs an admin caller. Setting
    /// it to its current value is a no-op.
    pub async fn update(
        &self,
        ctx: &IdentityContext,
        id: IdentityId,
        changes: ProfileChanges,
    ) -> ApiResult<Identity> {
        let identity = self.load(id).await?;
        policy::evaluate(
            ctx,
            &policies::UPDATE_IDENTITY,
            Some(&OwnershipTarget::owned_by(identity.id)),
        )?;
        validate_changes(&changes)?;

        let role = changes.role.filter(|role| *role != identity.role);
        if let Some(role) = role {
            policy::evaluate(ctx, &policies::ASSIGN_ROLE, None).inspect_err(|_| {
                tracing::warn!(
                    caller_id = %ctx.subject_id,
                    target_id = %id,
                    requested_role = %role,
                    "Role change denied"
                );
            })?;
        }

        let secret_digest = match changes.secret {
            Some(secret) => Some(self.hasher.hash(secret).await?),
            None => None,
        };

        let updated = self
            .identities
            .update(
                id,
                IdentityUpdate {
                    display_name: changes.display_name,
                    external_key: changes.external_key,
                    secret_digest,
                    role,
                },
            )
            .await?;

        tracing::info!(identity_id = %id, caller_id = %ctx.subject_id, "Identity updated");
        Ok(updated)
    }

    /// Deletes identity `id`.
    pub async fn delete(&self, ctx: &IdentityContext, id: IdentityId) -> ApiResult<()> {
        policy::evaluate(ctx, &policies::DELETE_IDENTITY, None)?;

        if self.identities.delete(id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Identity"))
        }
    }

    async fn load(&self, id: IdentityId) -> ApiResult<Identity> {
        self.identities
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Identity"))
    }
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("hasher", &self.hasher)
            .field("codec", &self.codec)
            .field("allow_admin_bootstrap", &self.allow_admin_bootstrap)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Validation
// =============================================================================

fn duplicate_key(key: &str) -> ApiError {
    ApiError::conflict(format!("External key '{}' is already registered", key))
}

fn check_display_name(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.add("display_name", "must not be empty");
    }
}

fn check_external_key(errors: &mut ValidationErrors, value: &str) {
    if value.is_empty() {
        errors.add("external_key", "must not be empty");
    } else if value.contains(char::is_whitespace) {
        errors.add("external_key", "must not contain whitespace");
    }
}

fn check_secret(errors: &mut ValidationErrors, value: &str) {
    let len = value.chars().count();
    if len < MIN_SECRET_LEN {
        errors.add(
            "secret",
            format!("must be at least {} characters", MIN_SECRET_LEN),
        );
    } else if len > MAX_SECRET_LEN {
        errors.add(
            "secret",
            format!("must be at most {} characters", MAX_SECRET_LEN),
        );
    }
}

fn validate_registration(registration: &Registration) -> ApiResult<()> {
    let mut errors = ValidationErrors::new();
    check_display_name(&mut errors, &registration.display_name);
    check_external_key(&mut errors, &registration.external_key);
    check_secret(&mut errors, &registration.secret);
    errors.into_result(())
}

fn validate_changes(changes: &ProfileChanges) -> ApiResult<()> {
    let mut errors = ValidationErrors::new();
    if let Some(display_name) = &changes.display_name {
        check_display_name(&mut errors, display_name);
    }
    if let Some(external_key) = &changes.external_key {
        check_external_key(&mut errors, external_key);
    }
    if let Some(secret) = &changes.secret {
        check_secret(&mut errors, secret);
    }
    errors.into_result(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use crate::hasher::HasherConfig;
    use crate::store::MemoryIdentityStore;

    fn service() -> CredentialService {
        let codec =
            TokenCodec::new(TokenConfig::new("credential-test-secret-long-enough-bytes")).unwrap();
        CredentialService::new(
            Arc::new(MemoryIdentityStore::new()),
            CredentialHasher::new(&HasherConfig::minimal()).unwrap(),
            Arc::new(codec),
        )
    }

    fn registration(key: &str, role: Option<Role>) -> Registration {
        Registration {
            display_name: format!("{} name", key),
            external_key: key.to_string(),
            secret: "s3cret-value".to_string(),
            role,
        }
    }

    fn ctx(identity: &Identity) -> IdentityContext {
        IdentityContext::new(identity.id, identity.role)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = service();
        let ada = service.register(registration("ada", None), None).await.unwrap();

        assert_eq!(ada.role, Role::StandardUser);
        assert_ne!(ada.secret_digest, "s3cret-value");

        let issued = service.login("ada", "s3cret-value").await.unwrap();
        assert_eq!(issued.expires_in, 3600);
        let verified = service.codec.verify(&issued.token, Utc::now()).unwrap();
        assert_eq!(verified.subject_id, ada.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = service();
        service.register(registration("ada", None), None).await.unwrap();

        assert!(matches!(
            service.login("nobody", "s3cret-value").await,
            Err(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            service.login("ada", "wrong-secret").await,
            Err(ApiError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let service = service();
        let first = service.register(registration("ada", None), None).await.unwrap();

        let mut second = registration("ada", None);
        second.secret = "another-secret".to_string();
        assert!(matches!(
            service.register(second, None).await,
            Err(ApiError::Conflict { .. })
        ));

        assert!(service.login("ada", "s3cret-value").await.is_ok());
        assert_eq!(service.load(first.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let service = service();
        let mut bad = registration("has space", None);
        bad.secret = "short".to_string();
        bad.display_name = "  ".to_string();

        match service.register(bad, None).await {
            Err(ApiError::Validation {
                errors: Some(errors),
                ..
            }) => assert_eq!(errors.fields.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_bootstrap_only_once() {
        let service = service();
        let admin = service
            .register(registration("root", Some(Role::Admin)), None)
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        assert!(matches!(
            service
                .register(registration("mallory", Some(Role::Admin)), None)
                .await,
            Err(ApiError::Forbidden { .. })
        ));

        let user = service.register(registration("bob", None), None).await.unwrap();
        assert!(matches!(
            service
                .register(registration("eve", Some(Role::Admin)), Some(ctx(&user)))
                .await,
            Err(ApiError::Forbidden { .. })
        ));

        let second_admin = service
            .register(registration("ops", Some(Role::Admin)), Some(ctx(&admin)))
            .await
            .unwrap();
        assert_eq!(second_admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_bootstrap_disabled() {
        let service = service().with_admin_bootstrap(false);
        assert!(matches!(
            service
                .register(registration("root", Some(Role::Admin)), None)
                .await,
            Err(ApiError::Forbidden { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bootstrap_single_winner() {
        let service = service();
        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .register(registration(&format!("root{}", i), Some(Role::Admin)), None)
                    .await
            }));
        }

        let mut admins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admins += 1;
            }
        }
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn test_update_own_profile() {
        let service = service();
        let ada = service.register(registration("ada", None), None).await.unwrap();

        let updated = service
            .update(
                &ctx(&ada),
                ada.id,
                ProfileChanges {
                    display_name: Some("Ada L.".to_string()),
                    secret: Some("new-secret".to_string()),
                    role: Some(Role::StandardUser),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.display_name, "Ada L.");
        assert_eq!(updated.role, Role::StandardUser);
        assert!(service.login("ada", "new-secret").await.is_ok());
        assert!(service.login("ada", "s3cret-value").await.is_err());
    }

    #[tokio::test]
    async fn test_self_elevation_denied() {
        let service = service();
        service
            .register(registration("root", Some(Role::Admin)), None)
            .await
            .unwrap();
        let ada = service.register(registration("ada", None), None).await.unwrap();

        let result = service
            .update(
                &ctx(&ada),
                ada.id,
                ProfileChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
        assert_eq!(service.load(ada.id).await.unwrap().role, Role::StandardUser);
    }

    #[tokio::test]
    async fn test_update_checks_target_before_fields() {
        let service = service();
        let ada = service.register(registration("ada", None), None).await.unwrap();
        let bob = service.register(registration("bob", None), None).await.unwrap();
        let invalid = || ProfileChanges {
            secret: Some("x".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.update(&ctx(&ada), IdentityId::new(), invalid()).await,
            Err(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            service.update(&ctx(&ada), bob.id, invalid()).await,
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            service.update(&ctx(&ada), ada.id, invalid()).await,
            Err(ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_admin_manages_others() {
        let service = service();
        let root = service
            .register(registration("root", Some(Role::Admin)), None)
            .await
            .unwrap();
        let ada = service.register(registration("ada", None), None).await.unwrap();
        let bob = service.register(registration("bob", None), None).await.unwrap();

        assert!(matches!(
            service.get(&ctx(&bob), ada.id).await,
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            service.update(&ctx(&bob), ada.id, ProfileChanges::default()).await,
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            service.get(&ctx(&root), IdentityId::new()).await,
            Err(ApiError::NotFound { .. })
        ));

        let promoted = service
            .update(
                &ctx(&root),
                ada.id,
                ProfileChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);

        assert!(matches!(
            service.delete(&ctx(&bob), ada.id).await,
            Err(ApiError::Forbidden { .. })
        ));
        service.delete(&ctx(&root), bob.id).await.unwrap();
        assert!(matches!(
            service.delete(&ctx(&root), bob.id).await,
            Err(ApiError::NotFound { .. })
        ));
        assert_eq!(service.list(&ctx(&root), 0, 10).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_update_key_conflict() {
        let service = service();
        let ada = service.register(registration("ada", None), None).await.unwrap();
        service.register(registration("bob", None), None).await.unwrap();

        let result = service
            .update(
                &ctx(&ada),
                ada.id,
                ProfileChanges {
                    external_key: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::Conflict { .. })));
    }
}
