//! Login, profile cache and logout.

use std::fmt;
use std::sync::Arc;

use beetime_domain::{AuthError, AuthProviderKind, AuthRequest, Credential, SessionProfile};
use tracing::{info, warn};

use super::credential_store::SESSION_KEY;
use super::{CredentialStore, MicrosoftIdentityAdapter, RefreshOutcome};
use crate::ports::{BackendApi, BackendError, KeyValueStorage};

/// How the user wants to sign in.
#[derive(Clone)]
pub enum LoginMethod {
    /// Username and password checked by the backend.
    Local {
        /// Login name
        username: String,
        /// Plain text password
        password: String,
    },
    /// Microsoft identity platform.
    Microsoft,
}

impl fmt::Debug for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { username, .. } => f
                .debug_struct("Local")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Microsoft => f.write_str("Microsoft"),
        }
    }
}

/// Result of a combined [`SessionManager::login`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Credential stored and profile loaded.
    Authenticated(SessionProfile),
    /// Credential stored, but the profile could not be loaded. The session
    /// is valid; loading can be retried with [`SessionManager::load_session`].
    AuthenticatedWithoutProfile(AuthError),
    /// Microsoft sign-in continues in the browser; the result arrives on the
    /// next launch.
    RedirectStarted,
}

/// Orchestrates login and owns the cached [`SessionProfile`].
pub struct SessionManager {
    backend: Arc<dyn BackendApi>,
    credentials: CredentialStore,
    identity: Arc<MicrosoftIdentityAdapter>,
}

impl SessionManager {
    /// Creates a session manager.
    #[must_use]
    pub fn new(
        backend: Arc<dyn BackendApi>,
        credentials: CredentialStore,
        identity: Arc<MicrosoftIdentityAdapter>,
    ) -> Self {
        Self {
            backend,
            credentials,
            identity,
        }
    }

    fn storage(&self) -> &dyn KeyValueStorage {
        self.credentials.storage().as_ref()
    }

    /// Checks username and password with the backend and stores the
    /// returned token. Does not load the profile.
    ///
    /// # Errors
    /// `CredentialRejected` if the backend refuses the login, `Backend` if it
    /// could not be reached, `Storage` if the credential cannot be written.
    pub async fn login_local(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        let request = AuthRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.backend.authenticate(&request).await.map_err(|e| {
            warn!(%username, error = %e, "local login failed");
            match e {
                BackendError::Unauthorized { message }
                | BackendError::Status {
                    status: 400 | 403,
                    message,
                } => AuthError::CredentialRejected { message },
                other => AuthError::Backend {
                    message: other.to_string(),
                },
            }
        })?;

        if response.token.is_empty() {
            return Err(AuthError::Backend {
                message: "backend returned an empty token".to_string(),
            });
        }

        self.credentials
            .begin_session(&response.token, AuthProviderKind::Local)?;
        info!(%username, "local login succeeded");
        Ok(Credential::new(response.token, AuthProviderKind::Local))
    }

    /// Signs in through the Microsoft adapter, which stores the credential
    /// itself on success.
    ///
    /// A cached profile survives only if the session was already a Microsoft
    /// one; switching over from a local session starts without a profile.
    ///
    /// # Errors
    /// Whatever [`MicrosoftIdentityAdapter::refresh`] returns.
    pub async fn login_microsoft(&self) -> Result<RefreshOutcome, AuthError> {
        let continues_session = self
            .credentials
            .get()
            .is_some_and(|credential| credential.provider == AuthProviderKind::Microsoft);

        let outcome = self.identity.refresh().await?;
        if !continues_session && matches!(outcome, RefreshOutcome::Refreshed(_)) {
            self.storage().remove(SESSION_KEY)?;
        }
        Ok(outcome)
    }

    /// Fetches the profile of the current credential and caches it.
    ///
    /// A failure never touches the stored credential; the caller decides
    /// whether it means "logged out".
    ///
    /// # Errors
    /// `ProfileLoadFailed` on any backend failure, `Storage` if the cache
    /// cannot be written.
    pub async fn load_session(&self) -> Result<SessionProfile, AuthError> {
        let profile = self.backend.current_user().await.map_err(|e| {
            warn!(error = %e, "profile load failed");
            AuthError::ProfileLoadFailed {
                message: e.to_string(),
            }
        })?;

        let json = serde_json::to_string(&profile).map_err(|e| AuthError::Storage {
            message: e.to_string(),
        })?;
        self.storage().set(SESSION_KEY, &json)?;

        info!(username = %profile.username, "session profile loaded");
        Ok(profile)
    }

    /// Signs in and loads the profile as one step.
    ///
    /// # Errors
    /// Only login failures are errors. A profile failure after a successful
    /// login is reported as [`LoginOutcome::AuthenticatedWithoutProfile`].
    pub async fn login(&self, method: LoginMethod) -> Result<LoginOutcome, AuthError> {
        match method {
            LoginMethod::Local { username, password } => {
                self.login_local(&username, &password).await?;
            }
            LoginMethod::Microsoft => {
                if self.login_microsoft().await? == RefreshOutcome::RedirectStarted {
                    return Ok(LoginOutcome::RedirectStarted);
                }
            }
        }

        Ok(match self.load_session().await {
            Ok(profile) => LoginOutcome::Authenticated(profile),
            Err(e) => LoginOutcome::AuthenticatedWithoutProfile(e),
        })
    }

    /// The cached profile, if one was loaded and is still readable.
    #[must_use]
    pub fn profile(&self) -> Option<SessionProfile> {
        let raw = self.storage().get(SESSION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "cached profile is unreadable");
                None
            }
        }
    }

    /// True only if a cached profile says `admin`. Fails closed.
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        self.profile()
            .is_some_and(|profile| profile.is_administrator())
    }

    /// True if a usable credential is stored.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.credentials.is_logged_in()
    }

    /// Clears the credential, the cached profile and the rest of the client
    /// storage. Safe to call repeatedly.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be written.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.credentials.clear()?;
        self.storage().clear()?;
        info!("logged out");
        Ok(())
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
