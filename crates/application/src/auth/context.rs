//! Explicitly constructed auth components and the boot sequence.

use std::sync::Arc;

use beetime_domain::{AuthError, AuthProviderCapabilities, Credential};
use tracing::{info, warn};
use url::Url;

use super::{
    AdapterState, AuthProviderRegistry, CredentialStore, MicrosoftIdentityAdapter,
    RequestAuthInterceptor, SessionManager,
};
use crate::ports::{BackendApi, IdentityClientFactory, RedirectResponse};

/// How the application was launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootMode {
    /// Ordinary start.
    Fresh,
    /// Relaunched by the identity platform at the end of an interactive
    /// sign-in.
    Resumed(RedirectResponse),
}

impl BootMode {
    /// Classifies the launch URL. No URL, or one without a redirect result,
    /// is a fresh start.
    #[must_use]
    pub fn classify(launch_url: Option<&Url>) -> Self {
        launch_url
            .and_then(RedirectResponse::detect)
            .map_or(Self::Fresh, Self::Resumed)
    }

    /// True for [`BootMode::Resumed`].
    #[must_use]
    pub const fn is_resumed(&self) -> bool {
        matches!(self, Self::Resumed(_))
    }
}

/// What [`AuthContext::boot`] found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootReport {
    /// Enabled login methods, or `None` if the probe failed.
    pub capabilities: Option<AuthProviderCapabilities>,
    /// Adapter state after boot.
    pub identity: AdapterState,
    /// Outcome of completing the redirect, for a resumed launch.
    pub resumed: Option<Result<Credential, AuthError>>,
    /// Whether a credential is stored once boot is done.
    pub logged_in: bool,
}

/// Every auth component of one application instance.
///
/// Built once at start-up and handed to whatever needs it; there is no
/// global instance.
pub struct AuthContext {
    backend: Arc<dyn BackendApi>,
    credentials: CredentialStore,
    providers: AuthProviderRegistry,
    identity: Arc<MicrosoftIdentityAdapter>,
    session: SessionManager,
    interceptor: RequestAuthInterceptor,
}

impl AuthContext {
    /// Wires the components around one credential store and backend.
    ///
    /// The backend client is expected to run [`Self::interceptor`] (or an
    /// interceptor over the same store) on each request.
    #[must_use]
    pub fn new(credentials: CredentialStore, backend: Arc<dyn BackendApi>) -> Self {
        let identity = Arc::new(MicrosoftIdentityAdapter::new(credentials.clone()));
        Self {
            providers: AuthProviderRegistry::new(backend.clone()),
            session: SessionManager::new(backend.clone(), credentials.clone(), identity.clone()),
            interceptor: RequestAuthInterceptor::new(credentials.clone()),
            backend,
            credentials,
            identity,
        }
    }

    /// The credential store.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// The provider registry.
    #[must_use]
    pub const fn providers(&self) -> &AuthProviderRegistry {
        &self.providers
    }

    /// The Microsoft adapter.
    #[must_use]
    pub fn identity(&self) -> &MicrosoftIdentityAdapter {
        &self.identity
    }

    /// The session manager.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The request interceptor.
    #[must_use]
    pub const fn interceptor(&self) -> &RequestAuthInterceptor {
        &self.interceptor
    }

    /// Brings the auth layer up.
    ///
    /// 1. `mode` must already be classified from the launch URL.
    /// 2. Probes the enabled login methods. A failed probe is logged and
    ///    boot continues without capabilities.
    /// 3. If Microsoft sign-in is enabled, or the launch resumes a redirect,
    ///    configures and initializes the identity adapter.
    /// 4. On a resumed launch, completes the redirect. Its result is
    ///    reported, not raised.
    ///
    /// # Errors
    /// Fails only if the identity adapter cannot be configured or
    /// initialized.
    pub async fn boot(
        &self,
        mode: &BootMode,
        factory: &dyn IdentityClientFactory,
        redirect_uri: Option<String>,
    ) -> Result<BootReport, AuthError> {
        info!(resumed = mode.is_resumed(), "booting auth");

        let capabilities = self.providers.fetch().await.ok();
        let microsoft = capabilities.is_some_and(|caps| caps.microsoft_enabled);

        if microsoft || mode.is_resumed() {
            self.identity
                .configure(self.backend.as_ref(), redirect_uri)
                .await?;
            self.identity.initialize(factory).await?;
        }

        let resumed = match mode {
            BootMode::Fresh => None,
            BootMode::Resumed(response) => {
                let result = self.identity.complete_redirect(response).await;
                if let Err(e) = &result {
                    warn!(error = %e, "could not complete sign-in from redirect");
                }
                Some(result)
            }
        };

        let report = BootReport {
            capabilities,
            identity: self.identity.state(),
            resumed,
            logged_in: self.credentials.is_logged_in(),
        };
        info!(
            identity = report.identity.as_str(),
            logged_in = report.logged_in,
            "auth boot complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("credentials", &self.credentials)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
