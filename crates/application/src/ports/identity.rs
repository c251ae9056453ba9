//! Identity SDK port
//!
//! The Microsoft identity SDK is an external collaborator. This port is the
//! part of its surface the session core drives: silent acquisition, the
//! redirect-based interactive flow, and completion of a returned redirect.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use beetime_domain::{AuthError, MicrosoftTenantConfig, TokenAcquisition};

/// Parameters the identity platform appends to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectResponse {
    /// The full URL the application was launched with.
    pub url: Url,
    /// Authorization code, on success.
    pub code: Option<String>,
    /// Error code, on failure.
    pub error: Option<String>,
    /// Opaque state echoed back by the platform.
    pub state: Option<String>,
}

impl RedirectResponse {
    /// Recognises a launch URL that carries a redirect result.
    ///
    /// The platform answers either in the query string or in the fragment,
    /// depending on the response mode. A URL with neither `code` nor `error`
    /// is an ordinary launch.
    #[must_use]
    pub fn detect(url: &Url) -> Option<Self> {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if let Some(fragment) = url.fragment() {
            pairs.extend(
                url::form_urlencoded::parse(fragment.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned())),
            );
        }

        let find = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        let code = find("code");
        let error = find("error");
        if code.is_none() && error.is_none() {
            return None;
        }

        Some(Self {
            url: url.clone(),
            code,
            error,
            state: find("state"),
        })
    }
}

/// An identity client application, constructed once per boot.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Requests a token using the cached session, without user interaction.
    async fn acquire_token_silent(&self, scopes: &[&str]) -> TokenAcquisition;

    /// Starts the interactive flow by navigating away from the application.
    ///
    /// Returning `Ok` means the navigation was issued; the result arrives on
    /// the next launch as a [`RedirectResponse`].
    ///
    /// # Errors
    ///
    /// Returns an error if the navigation could not be started.
    async fn acquire_token_redirect(&self, scopes: &[&str]) -> Result<(), AuthError>;

    /// Completes an interactive flow the application was relaunched from.
    async fn handle_redirect(&self, response: &RedirectResponse) -> TokenAcquisition;
}

/// Builds the identity client from the tenant configuration.
#[async_trait]
pub trait IdentityClientFactory: Send + Sync {
    /// Constructs the client application.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    async fn create(
        &self,
        config: &MicrosoftTenantConfig,
    ) -> Result<Arc<dyn IdentityClient>, AuthError>;
}
