//! Per-request credential injection.

use beetime_domain::Headers;
use beetime_domain::request::{AUTH_PROVIDER, AUTHORIZATION};

use super::CredentialStore;

/// Attaches the stored credential to an outbound request.
///
/// Runs synchronously before dispatch. It only reads the credential store.
#[derive(Debug, Clone)]
pub struct RequestAuthInterceptor {
    credentials: CredentialStore,
}

impl RequestAuthInterceptor {
    /// Creates an interceptor reading from `credentials`.
    #[must_use]
    pub const fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// Sets or clears the auth headers of one request.
    ///
    /// With a credential: exactly one `Authorization: Bearer <token>` and one
    /// `X-Auth-Provider`. Without one: both headers are removed, including any
    /// left on a reused request template.
    pub fn apply(&self, headers: &mut Headers) {
        if let Some(credential) = self.credentials.get() {
            headers.set(AUTHORIZATION, credential.authorization_header());
            headers.set(AUTH_PROVIDER, credential.provider.as_str());
        } else {
            headers.remove(AUTHORIZATION);
            headers.remove(AUTH_PROVIDER);
        }
    }
}
