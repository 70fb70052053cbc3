// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::config::ApiConfig;
use crate::credentials::CredentialService;
use crate::error::{ApiError, ApiResult};
use crate::hasher::CredentialHasher;
use crate::store::{IdentityStore, MemoryIdentityStore, MemoryResourceStore, ResourceStore};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Everything in it is immutable or internally synchronized, so cloning the
/// state per request only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Token codec.
    pub codec: Arc<TokenCodec>,
    /// Registration, login and identity management.
    pub credentials: CredentialService,
    /// Identity records.
    pub identities: Arc<dyn IdentityStore>,
    /// Resource records.
    pub resources: Arc<dyn ResourceStore>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the credential service.
    pub fn credentials(&self) -> &CredentialService {
        &self.credentials
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("codec", &self.codec)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
///
/// Stores default to empty in-memory implementations.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    identities: Option<Arc<dyn IdentityStore>>,
    resources: Option<Arc<dyn ResourceStore>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the identity store.
    pub fn identity_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.identities = Some(store);
        self
    }

    /// Sets the resource store.
    pub fn resource_store(mut self, store: Arc<dyn ResourceStore>) -> Self {
        self.resources = Some(store);
        self
    }

    /// Builds the AppState.
    ///
    /// Fails if the configuration does not validate.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let codec = Arc::new(TokenCodec::new(config.token.clone())?);
        let hasher = CredentialHasher::new(&config.hashing)
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let identities = self
            .identities
            .unwrap_or_else(|| Arc::new(MemoryIdentityStore::new()));
        let resources = self
            .resources
            .unwrap_or_else(|| Arc::new(MemoryResourceStore::new()));

        let credentials = CredentialService::new(identities.clone(), hasher, codec.clone())
            .with_admin_bootstrap(config.allow_admin_bootstrap);

        Ok(AppState {
            config: Arc::new(config),
            codec,
            credentials,
            identities,
            resources,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.codec.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use crate::hasher::HasherConfig;

    fn test_config() -> ApiConfig {
        ApiConfig::default()
            .with_token(TokenConfig::new("test-secret-key-that-is-long-enough-for-testing"))
            .with_hashing(HasherConfig::minimal())
    }

    #[test]
    fn test_app_state_builder() {
        let state = AppState::builder().config(test_config()).build().unwrap();
        assert_eq!(state.codec().issuer(), "keygate");
    }

    #[test]
    fn test_app_state_requires_secret() {
        assert!(AppState::builder().build().is_err());
    }

    #[tokio::test]
    async fn test_app_state_shares_identity_store() {
        let store = Arc::new(MemoryIdentityStore::new());
        let state = AppState::builder()
            .config(test_config())
            .identity_store(store.clone())
            .build()
            .unwrap();

        state
            .credentials()
            .register(
                crate::credentials::Registration {
                    display_name: "Ada".to_string(),
                    external_key: "ada".to_string(),
                    secret: "s3cret-value".to_string(),
                    role: None,
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
    }
}
