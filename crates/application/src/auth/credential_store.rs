//! Durable credential storage.
//!
//! The credential lives in two independent storage slots, `accessToken` and
//! `authProvider`. `set` drops the old token before touching the provider
//! and writes the new token last, so an interrupted `set` leaves an absent
//! session, never a token paired with the wrong provider.

use std::sync::Arc;

use beetime_domain::{AuthError, AuthProviderKind, Credential};
use tracing::{debug, warn};

use crate::ports::KeyValueStorage;

/// Storage key of the bearer token. An empty value means "no session".
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the issuing provider.
pub const AUTH_PROVIDER_KEY: &str = "authProvider";
/// Storage key of the cached profile.
pub const SESSION_KEY: &str = "session";

/// Reads and writes the current [`Credential`].
///
/// Cloning is cheap; clones share the same underlying storage.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl CredentialStore {
    /// Creates a store over the given client storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Returns the current credential.
    ///
    /// A missing or empty token is an absent session. A token whose provider
    /// slot is missing or unreadable is also treated as absent.
    #[must_use]
    pub fn get(&self) -> Option<Credential> {
        let token = self
            .storage
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())?;

        let raw_provider = self.storage.get(AUTH_PROVIDER_KEY).unwrap_or_default();
        match raw_provider.parse::<AuthProviderKind>() {
            Ok(provider) => Some(Credential::new(token, provider)),
            Err(e) => {
                warn!(error = %e, "stored token has no usable provider, ignoring it");
                None
            }
        }
    }

    /// Persists a credential, replacing the current one.
    ///
    /// # Errors
    /// Returns an error if either slot cannot be written.
    pub fn set(&self, token: &str, provider: AuthProviderKind) -> Result<(), AuthError> {
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.set(AUTH_PROVIDER_KEY, provider.as_str())?;
        self.storage.set(ACCESS_TOKEN_KEY, token)?;
        debug!(%provider, token = %beetime_domain::token_preview(token), "credential stored");
        Ok(())
    }

    /// Persists the credential of a newly signed-in user.
    ///
    /// Unlike [`set`](Self::set), the cached profile of the previous session
    /// is dropped first, so it can never be read back under the new token.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be written.
    pub fn begin_session(&self, token: &str, provider: AuthProviderKind) -> Result<(), AuthError> {
        self.storage.remove(SESSION_KEY)?;
        self.set(token, provider)
    }

    /// Removes token, provider and cached profile.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be written.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(AUTH_PROVIDER_KEY)?;
        self.storage.remove(SESSION_KEY)?;
        debug!("credential cleared");
        Ok(())
    }

    /// Returns true if a usable credential is stored.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.get().is_some()
    }

    pub(crate) fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}
