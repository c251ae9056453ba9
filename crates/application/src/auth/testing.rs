//! Scripted fakes of the ports, shared by the auth tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use beetime_domain::{
    AuthError, AuthProviderCapabilities, AuthRequest, AuthResponse, MicrosoftAuthSettings,
    MicrosoftTenantConfig, SessionProfile, TokenAcquisition,
};

use crate::ports::{BackendApi, BackendError, IdentityClient, IdentityClientFactory, RedirectResponse};

fn unscripted() -> BackendError {
    BackendError::Transport("not scripted".to_string())
}

/// Builds a profile with the given username and access level.
pub fn profile(username: &str, access_level: &str) -> SessionProfile {
    SessionProfile {
        id: 7,
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        access_level: access_level.to_string(),
        extra: std::collections::BTreeMap::new(),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackendCalls {
    pub providers: usize,
    pub tenant: usize,
    pub authenticate: usize,
    pub me: usize,
}

/// Backend with canned answers per endpoint.
pub struct FakeBackend {
    providers: Result<AuthProviderCapabilities, BackendError>,
    tenant: Result<MicrosoftAuthSettings, BackendError>,
    login: Option<(String, String, String)>,
    login_error: Option<BackendError>,
    me: Result<SessionProfile, BackendError>,
    calls: Mutex<BackendCalls>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            providers: Err(unscripted()),
            tenant: Err(unscripted()),
            login: None,
            login_error: None,
            me: Err(unscripted()),
            calls: Mutex::new(BackendCalls::default()),
        }
    }

    pub fn with_providers(mut self, local: bool, microsoft: bool) -> Self {
        self.providers = Ok(AuthProviderCapabilities {
            local_enabled: local,
            microsoft_enabled: microsoft,
        });
        self
    }

    pub fn with_providers_error(mut self, error: BackendError) -> Self {
        self.providers = Err(error);
        self
    }

    pub fn with_tenant(mut self, client_id: &str, tenant_id: &str) -> Self {
        self.tenant = Ok(MicrosoftAuthSettings {
            client_id: client_id.to_string(),
            tenant_id: tenant_id.to_string(),
        });
        self
    }

    pub fn with_tenant_error(mut self, error: BackendError) -> Self {
        self.tenant = Err(error);
        self
    }

    /// Accepts exactly this username/password pair and answers with `token`.
    pub fn with_login(mut self, username: &str, password: &str, token: &str) -> Self {
        self.login = Some((username.to_string(), password.to_string(), token.to_string()));
        self
    }

    pub fn with_login_error(mut self, error: BackendError) -> Self {
        self.login_error = Some(error);
        self
    }

    pub fn with_me(mut self, profile: SessionProfile) -> Self {
        self.me = Ok(profile);
        self
    }

    pub fn with_me_error(mut self, error: BackendError) -> Self {
        self.me = Err(error);
        self
    }

    pub fn calls(&self) -> BackendCalls {
        *self.calls.lock()
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn auth_providers(&self) -> Result<AuthProviderCapabilities, BackendError> {
        self.calls.lock().providers += 1;
        self.providers.clone()
    }

    async fn microsoft_settings(&self) -> Result<MicrosoftAuthSettings, BackendError> {
        self.calls.lock().tenant += 1;
        self.tenant.clone()
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, BackendError> {
        self.calls.lock().authenticate += 1;
        if let Some(error) = &self.login_error {
            return Err(error.clone());
        }
        match &self.login {
            Some((username, password, token))
                if *username == request.username && *password == request.password =>
            {
                Ok(AuthResponse {
                    token: token.clone(),
                })
            }
            _ => Err(BackendError::Unauthorized {
                message: "invalid credentials".to_string(),
            }),
        }
    }

    async fn current_user(&self) -> Result<SessionProfile, BackendError> {
        self.calls.lock().me += 1;
        self.me.clone()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IdentityCalls {
    pub silent: usize,
    pub redirect: usize,
    pub handled: usize,
}

/// Identity client with scripted acquisition results.
pub struct FakeIdentity {
    silent: TokenAcquisition,
    redirect_result: TokenAcquisition,
    delay: Option<Duration>,
    calls: Mutex<IdentityCalls>,
    last_scopes: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self {
            silent: TokenAcquisition::Failed {
                reason: "not scripted".to_string(),
            },
            redirect_result: TokenAcquisition::InteractionRequired,
            delay: None,
            calls: Mutex::new(IdentityCalls::default()),
            last_scopes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_silent(mut self, result: TokenAcquisition) -> Self {
        self.silent = result;
        self
    }

    pub fn with_redirect_result(mut self, result: TokenAcquisition) -> Self {
        self.redirect_result = result;
        self
    }

    /// Makes every silent acquisition take `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> IdentityCalls {
        *self.calls.lock()
    }

    pub fn last_scopes(&self) -> Vec<String> {
        self.last_scopes.lock().clone()
    }

    fn record_scopes(&self, scopes: &[&str]) {
        *self.last_scopes.lock() = scopes.iter().map(ToString::to_string).collect();
    }
}

#[async_trait]
impl IdentityClient for FakeIdentity {
    async fn acquire_token_silent(&self, scopes: &[&str]) -> TokenAcquisition {
        self.calls.lock().silent += 1;
        self.record_scopes(scopes);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.silent.clone()
    }

    async fn acquire_token_redirect(&self, scopes: &[&str]) -> Result<(), AuthError> {
        self.calls.lock().redirect += 1;
        self.record_scopes(scopes);
        Ok(())
    }

    async fn handle_redirect(&self, _response: &RedirectResponse) -> TokenAcquisition {
        self.calls.lock().handled += 1;
        self.redirect_result.clone()
    }
}

/// Hands out one shared [`FakeIdentity`], or fails construction.
pub struct FakeIdentityFactory {
    identity: Option<Arc<FakeIdentity>>,
    failure: Option<String>,
    created: AtomicUsize,
}

impl FakeIdentityFactory {
    pub fn new(identity: Arc<FakeIdentity>) -> Self {
        Self {
            identity: Some(identity),
            failure: None,
            created: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            identity: None,
            failure: Some(message.to_string()),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityClientFactory for FakeIdentityFactory {
    async fn create(
        &self,
        _config: &MicrosoftTenantConfig,
    ) -> Result<Arc<dyn IdentityClient>, AuthError> {
        match (&self.identity, &self.failure) {
            (Some(identity), None) => {
                self.created.fetch_add(1, Ordering::SeqCst);
                Ok(identity.clone())
            }
            (_, failure) => Err(AuthError::IdentityInitialization {
                message: failure.clone().unwrap_or_default(),
            }),
        }
    }
}
