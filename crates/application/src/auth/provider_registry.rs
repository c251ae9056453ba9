//! Enabled login methods.

use std::sync::Arc;

use beetime_domain::{AuthError, AuthProviderCapabilities};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::ports::BackendApi;

/// Probes the backend for the login methods it currently offers.
///
/// The first successful probe is kept for the lifetime of the registry;
/// failures are not cached and not retried.
pub struct AuthProviderRegistry {
    backend: Arc<dyn BackendApi>,
    capabilities: OnceCell<AuthProviderCapabilities>,
}

impl AuthProviderRegistry {
    /// Creates a registry backed by the given API.
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            backend,
            capabilities: OnceCell::new(),
        }
    }

    /// Returns the enabled login methods, calling the backend on first use.
    ///
    /// # Errors
    /// Returns `AuthError::CapabilityFetch` if the probe fails. The caller
    /// decides how to degrade, e.g. by showing only the local form.
    pub async fn fetch(&self) -> Result<AuthProviderCapabilities, AuthError> {
        self.capabilities
            .get_or_try_init(|| async {
                let capabilities = self.backend.auth_providers().await.map_err(|e| {
                    warn!(error = %e, "auth provider probe failed");
                    AuthError::CapabilityFetch {
                        message: e.to_string(),
                    }
                })?;
                info!(
                    local = capabilities.local_enabled,
                    microsoft = capabilities.microsoft_enabled,
                    "auth providers fetched"
                );
                Ok::<_, AuthError>(capabilities)
            })
            .await
            .copied()
    }

    /// Like [`fetch`](Self::fetch), but a failed probe offers every login
    /// method instead of none. The fallback is not cached.
    pub async fn fetch_or_all(&self) -> AuthProviderCapabilities {
        match self.fetch().await {
            Ok(capabilities) => capabilities,
            Err(e) => {
                warn!(error = %e, "offering every login method");
                AuthProviderCapabilities::all()
            }
        }
    }

    /// Capabilities of an earlier successful probe.
    #[must_use]
    pub fn cached(&self) -> Option<AuthProviderCapabilities> {
        self.capabilities.get().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::testing::FakeBackend;
    use crate::ports::BackendError;
    use beetime_domain::AuthProviderKind;

    #[tokio::test]
    async fn test_local_only_backend_hides_microsoft() {
        let backend = Arc::new(FakeBackend::new().with_providers(true, false));
        let registry = AuthProviderRegistry::new(backend);

        let caps = registry.fetch().await.unwrap();

        assert_eq!(caps.login_options(), vec![AuthProviderKind::Local]);
    }

    #[tokio::test]
    async fn test_capabilities_are_fetched_once() {
        let backend = Arc::new(FakeBackend::new().with_providers(true, true));
        let registry = AuthProviderRegistry::new(backend.clone());

        registry.fetch().await.unwrap();
        registry.fetch().await.unwrap();

        assert_eq!(backend.calls().providers, 1);
        assert!(registry.cached().is_some());
    }

    #[tokio::test]
    async fn test_probe_failure_is_not_retried_or_cached() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_providers_error(BackendError::Transport("connection refused".into())),
        );
        let registry = AuthProviderRegistry::new(backend.clone());

        let err = registry.fetch().await.unwrap_err();

        assert!(matches!(err, AuthError::CapabilityFetch { .. }));
        assert_eq!(backend.calls().providers, 1);
        assert!(registry.cached().is_none());
    }

    #[tokio::test]
    async fn test_failed_probe_offers_every_method() {
        let backend = Arc::new(
            FakeBackend::new().with_providers_error(BackendError::Status {
                status: 503,
                message: "maintenance".into(),
            }),
        );
        let registry = AuthProviderRegistry::new(backend);

        let caps = registry.fetch_or_all().await;

        assert_eq!(
            caps.login_options(),
            vec![AuthProviderKind::Local, AuthProviderKind::Microsoft]
        );
        assert!(registry.cached().is_none());
    }

    #[tokio::test]
    async fn test_fetch_or_all_keeps_a_successful_probe() {
        let backend = Arc::new(FakeBackend::new().with_providers(true, false));
        let registry = AuthProviderRegistry::new(backend);

        let caps = registry.fetch_or_all().await;

        assert_eq!(caps.login_options(), vec![AuthProviderKind::Local]);
        assert_eq!(registry.cached(), Some(caps));
    }
}
