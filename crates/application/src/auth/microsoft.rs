//! Microsoft identity platform adapter.
//!
//! Drives the external identity SDK through three states:
//!
//! - `Uninitialized`: nothing known about the tenant yet.
//! - `Configured`: tenant settings fetched, [`MicrosoftTenantConfig`] built.
//! - `Ready`: identity client constructed; `refresh` may run.
//!
//! Both the configuration and the client are set once and never replaced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use beetime_domain::{
    AuthError, AuthProviderKind, Credential, IDENTITY_SCOPES, MicrosoftTenantConfig,
    TokenAcquisition,
};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use super::CredentialStore;
use crate::ports::{BackendApi, IdentityClient, IdentityClientFactory, RedirectResponse};

/// Lifecycle state of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// No tenant configuration yet.
    Uninitialized,
    /// Tenant configuration built, no client yet.
    Configured,
    /// Identity client constructed.
    Ready,
}

impl AdapterState {
    /// Lowercase name for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Configured => "configured",
            Self::Ready => "ready",
        }
    }
}

/// What a successful `refresh` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new identity token is stored.
    Refreshed(Credential),
    /// Silent renewal needed the user; the interactive redirect was issued.
    /// The application is navigating away and resumes on the next launch.
    RedirectStarted,
}

type RefreshResult = Result<RefreshOutcome, AuthError>;

/// Wraps the identity SDK for the session core.
pub struct MicrosoftIdentityAdapter {
    credentials: CredentialStore,
    config: OnceLock<MicrosoftTenantConfig>,
    client: OnceCell<Arc<dyn IdentityClient>>,
    /// Result of the last completed refresh, shared with callers that were
    /// waiting while it ran.
    last_refresh: Mutex<Option<RefreshResult>>,
    refresh_generation: AtomicU64,
}

impl MicrosoftIdentityAdapter {
    /// Creates an uninitialized adapter writing tokens to `credentials`.
    #[must_use]
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            config: OnceLock::new(),
            client: OnceCell::new(),
            last_refresh: Mutex::new(None),
            refresh_generation: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AdapterState {
        if self.client.initialized() {
            AdapterState::Ready
        } else if self.config.get().is_some() {
            AdapterState::Configured
        } else {
            AdapterState::Uninitialized
        }
    }

    /// Tenant configuration, once configured.
    #[must_use]
    pub fn tenant_config(&self) -> Option<&MicrosoftTenantConfig> {
        self.config.get()
    }

    /// `Uninitialized → Configured`: fetches the tenant settings and builds
    /// the client configuration. Calling it again returns the existing one.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidConfiguration` if the settings cannot be
    /// fetched or are blank.
    pub async fn configure(
        &self,
        backend: &dyn BackendApi,
        redirect_uri: Option<String>,
    ) -> Result<&MicrosoftTenantConfig, AuthError> {
        if let Some(config) = self.config.get() {
            return Ok(config);
        }

        let settings = backend.microsoft_settings().await.map_err(|e| {
            warn!(error = %e, "could not fetch Microsoft tenant settings");
            AuthError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;

        let config = MicrosoftTenantConfig::from_settings(&settings, redirect_uri).map_err(|e| {
            AuthError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;

        info!(
            client_id = %config.client_id,
            authority = %config.authority,
            "Microsoft identity configured"
        );

        // A concurrent configure may have won; either value came from the same backend.
        Ok(self.config.get_or_init(|| config))
    }

    /// `Configured → Ready`: constructs the identity client. Runs once; a
    /// failure is meant to abort boot and is not retried here.
    ///
    /// # Errors
    /// Returns `AuthError::IdentityNotReady` before `configure`, or
    /// `AuthError::IdentityInitialization` if construction fails.
    pub async fn initialize(&self, factory: &dyn IdentityClientFactory) -> Result<(), AuthError> {
        let config = self.config.get().ok_or(AuthError::IdentityNotReady {
            state: self.state().as_str(),
            expected: AdapterState::Configured.as_str(),
        })?;

        self.client
            .get_or_try_init(|| async {
                let client = factory.create(config).await.map_err(|e| {
                    warn!(error = %e, "identity client construction failed");
                    AuthError::IdentityInitialization {
                        message: e.to_string(),
                    }
                })?;
                info!("Microsoft identity client ready");
                Ok::<_, AuthError>(client)
            })
            .await?;

        Ok(())
    }

    fn client(&self) -> Result<&Arc<dyn IdentityClient>, AuthError> {
        self.client.get().ok_or(AuthError::IdentityNotReady {
            state: self.state().as_str(),
            expected: AdapterState::Ready.as_str(),
        })
    }

    /// Renews the Microsoft session.
    ///
    /// Tries a silent acquisition first. If the platform needs the user,
    /// issues exactly one interactive redirect and never retries silently.
    ///
    /// Concurrent callers share one acquisition: whoever arrives while a
    /// refresh is running waits for it and receives its result.
    ///
    /// # Errors
    /// `IdentityNotReady` outside `Ready`, `TokenAcquisitionFailed` for any
    /// other platform failure. The stored credential is left as it was.
    pub async fn refresh(&self) -> Result<RefreshOutcome, AuthError> {
        let client = self.client()?;

        let observed = self.refresh_generation.load(Ordering::Acquire);
        let mut last = self.last_refresh.lock().await;
        if self.refresh_generation.load(Ordering::Acquire) != observed
            && let Some(shared) = last.as_ref()
        {
            debug!("joined a refresh that completed while waiting");
            return shared.clone();
        }

        let outcome = self.acquire(client.as_ref()).await;
        *last = Some(outcome.clone());
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn acquire(&self, client: &dyn IdentityClient) -> RefreshResult {
        match client.acquire_token_silent(&IDENTITY_SCOPES).await {
            TokenAcquisition::Acquired { id_token } => {
                self.credentials.set(&id_token, AuthProviderKind::Microsoft)?;
                Ok(RefreshOutcome::Refreshed(Credential::new(
                    id_token,
                    AuthProviderKind::Microsoft,
                )))
            }
            TokenAcquisition::InteractionRequired => {
                info!("silent token acquisition needs interaction, redirecting");
                client.acquire_token_redirect(&IDENTITY_SCOPES).await?;
                Ok(RefreshOutcome::RedirectStarted)
            }
            TokenAcquisition::Failed { reason } => {
                warn!(%reason, "silent token acquisition failed");
                Err(AuthError::TokenAcquisitionFailed { message: reason })
            }
        }
    }

    /// Finishes an interactive flow the application was relaunched from.
    ///
    /// # Errors
    /// `IdentityNotReady` outside `Ready`; `InteractionRequired` or
    /// `TokenAcquisitionFailed` if the platform did not issue a token.
    pub async fn complete_redirect(
        &self,
        response: &RedirectResponse,
    ) -> Result<Credential, AuthError> {
        let client = self.client()?;

        match client.handle_redirect(response).await {
            TokenAcquisition::Acquired { id_token } => {
                self.credentials
                    .begin_session(&id_token, AuthProviderKind::Microsoft)?;
                let credential = Credential::new(id_token, AuthProviderKind::Microsoft);
                info!("Microsoft sign-in completed from redirect");
                Ok(credential)
            }
            TokenAcquisition::InteractionRequired => Err(AuthError::InteractionRequired),
            TokenAcquisition::Failed { reason } => {
                warn!(%reason, "redirect completion failed");
                Err(AuthError::TokenAcquisitionFailed { message: reason })
            }
        }
    }
}

impl std::fmt::Debug for MicrosoftIdentityAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrosoftIdentityAdapter")
            .field("state", &self.state())
            .field("config", &self.config.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::SESSION_KEY;
    use crate::auth::testing::{FakeBackend, FakeIdentity, FakeIdentityFactory};
    use crate::ports::{BackendError, MemoryStorage};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn adapter() -> (CredentialStore, MicrosoftIdentityAdapter) {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
        (store.clone(), MicrosoftIdentityAdapter::new(store))
    }

    async fn ready(identity: Arc<FakeIdentity>) -> (CredentialStore, MicrosoftIdentityAdapter) {
        let (store, adapter) = adapter();
        let backend = FakeBackend::new().with_tenant("client-1", "tenant-1");
        adapter.configure(&backend, None).await.unwrap();
        adapter
            .initialize(&FakeIdentityFactory::new(identity))
            .await
            .unwrap();
        (store, adapter)
    }

    #[tokio::test]
    async fn test_state_machine_transitions() {
        let (_, adapter) = adapter();
        assert_eq!(adapter.state(), AdapterState::Uninitialized);

        let backend = FakeBackend::new().with_tenant("client-1", "tenant-1");
        let config = adapter
            .configure(&backend, Some("http://localhost:9000".into()))
            .await
            .unwrap();
        assert_eq!(config.authority, "https://login.microsoftonline.com/tenant-1");
        assert_eq!(adapter.state(), AdapterState::Configured);

        let factory = FakeIdentityFactory::new(Arc::new(FakeIdentity::new()));
        adapter.initialize(&factory).await.unwrap();
        adapter.initialize(&factory).await.unwrap();
        assert_eq!(adapter.state(), AdapterState::Ready);
        assert_eq!(factory.created(), 1);
    }

    #[tokio::test]
    async fn test_initialize_before_configure_fails() {
        let (_, adapter) = adapter();
        let factory = FakeIdentityFactory::new(Arc::new(FakeIdentity::new()));

        let err = adapter.initialize(&factory).await.unwrap_err();

        assert!(matches!(err, AuthError::IdentityNotReady { .. }));
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn test_configure_failure_leaves_uninitialized() {
        let (_, adapter) = adapter();
        let backend = FakeBackend::new()
            .with_tenant_error(BackendError::Transport("timeout".into()));

        let err = adapter.configure(&backend, None).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidConfiguration { .. }));
        assert_eq!(adapter.state(), AdapterState::Uninitialized);
    }

    #[tokio::test]
    async fn test_failed_construction_is_reported() {
        let (_, adapter) = adapter();
        let backend = FakeBackend::new().with_tenant("client-1", "tenant-1");
        adapter.configure(&backend, None).await.unwrap();

        let err = adapter
            .initialize(&FakeIdentityFactory::failing("bad authority"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::IdentityInitialization { .. }));
        assert_eq!(adapter.state(), AdapterState::Configured);
    }

    #[tokio::test]
    async fn test_refresh_requires_ready() {
        let (_, adapter) = adapter();
        let err = adapter.refresh().await.unwrap_err();
        assert_eq!(
            err,
            AuthError::IdentityNotReady {
                state: "uninitialized",
                expected: "ready"
            }
        );
    }

    #[tokio::test]
    async fn test_silent_success_stores_microsoft_credential() {
        let identity = Arc::new(FakeIdentity::new().with_silent(TokenAcquisition::Acquired {
            id_token: "id-token-1".into(),
        }));
        let (store, adapter) = ready(identity.clone()).await;

        let outcome = adapter.refresh().await.unwrap();

        let expected = Credential::new("id-token-1", AuthProviderKind::Microsoft);
        assert_eq!(outcome, RefreshOutcome::Refreshed(expected.clone()));
        assert_eq!(store.get(), Some(expected));
        assert_eq!(identity.calls().redirect, 0);
    }

    #[tokio::test]
    async fn test_interaction_required_redirects_exactly_once() {
        let identity = Arc::new(
            FakeIdentity::new().with_silent(TokenAcquisition::InteractionRequired),
        );
        let (store, adapter) = ready(identity.clone()).await;

        let outcome = adapter.refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::RedirectStarted);
        assert_eq!(identity.calls().silent, 1);
        assert_eq!(identity.calls().redirect, 1);
        assert_eq!(identity.last_scopes(), IDENTITY_SCOPES.map(String::from).to_vec());
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn test_other_failure_keeps_stale_token() {
        let identity = Arc::new(FakeIdentity::new().with_silent(TokenAcquisition::Failed {
            reason: "network down".into(),
        }));
        let (store, adapter) = ready(identity.clone()).await;
        store.set("stale", AuthProviderKind::Microsoft).unwrap();

        let err = adapter.refresh().await.unwrap_err();

        assert_eq!(
            err,
            AuthError::TokenAcquisitionFailed {
                message: "network down".into()
            }
        );
        assert_eq!(identity.calls().silent, 1);
        assert_eq!(identity.calls().redirect, 0);
        assert_eq!(store.get().unwrap().token, "stale");
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_round_trip() {
        let identity = Arc::new(
            FakeIdentity::new()
                .with_silent(TokenAcquisition::Acquired {
                    id_token: "shared".into(),
                })
                .with_delay(Duration::from_millis(50)),
        );
        let (_, adapter) = ready(identity.clone()).await;

        let (first, second) = tokio::join!(adapter.refresh(), adapter.refresh());

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(identity.calls().silent, 1);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_redirect_once() {
        let identity = Arc::new(
            FakeIdentity::new()
                .with_silent(TokenAcquisition::InteractionRequired)
                .with_delay(Duration::from_millis(50)),
        );
        let (_, adapter) = ready(identity.clone()).await;

        let (first, second) = tokio::join!(adapter.refresh(), adapter.refresh());

        assert_eq!(first.unwrap(), RefreshOutcome::RedirectStarted);
        assert_eq!(second.unwrap(), RefreshOutcome::RedirectStarted);
        assert_eq!(identity.calls().silent, 1);
        assert_eq!(identity.calls().redirect, 1);
    }

    #[tokio::test]
    async fn test_silent_refresh_keeps_cached_profile() {
        let identity = Arc::new(FakeIdentity::new().with_silent(TokenAcquisition::Acquired {
            id_token: "renewed".into(),
        }));
        let (store, adapter) = ready(identity).await;
        store.set("expired", AuthProviderKind::Microsoft).unwrap();
        store.storage().set(SESSION_KEY, r#"{"Username":"alice"}"#).unwrap();

        adapter.refresh().await.unwrap();

        assert_eq!(store.get().unwrap().token, "renewed");
        assert!(store.storage().get(SESSION_KEY).is_some());
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_hit_the_platform() {
        let identity = Arc::new(FakeIdentity::new().with_silent(TokenAcquisition::Acquired {
            id_token: "again".into(),
        }));
        let (_, adapter) = ready(identity.clone()).await;

        adapter.refresh().await.unwrap();
        adapter.refresh().await.unwrap();

        assert_eq!(identity.calls().silent, 2);
    }

    #[tokio::test]
    async fn test_complete_redirect_stores_credential() {
        let identity = Arc::new(FakeIdentity::new().with_redirect_result(
            TokenAcquisition::Acquired {
                id_token: "from-redirect".into(),
            },
        ));
        let (store, adapter) = ready(identity).await;
        let url = url::Url::parse("http://localhost:9000/#code=abc&state=s").unwrap();
        let response = RedirectResponse::detect(&url).unwrap();

        store.set("someone-else", AuthProviderKind::Microsoft).unwrap();
        store.storage().set(SESSION_KEY, r#"{"Username":"root"}"#).unwrap();

        let credential = adapter.complete_redirect(&response).await.unwrap();

        assert_eq!(credential.token, "from-redirect");
        assert_eq!(store.get(), Some(credential));
        assert_eq!(store.storage().get(SESSION_KEY), None);
    }
}
