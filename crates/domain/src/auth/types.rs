//! Authentication types shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Scopes requested from the Microsoft identity platform, silently and interactively.
pub const IDENTITY_SCOPES: [&str; 4] = ["openid", "profile", "email", "Calendars.ReadWrite"];

/// Authority host for Microsoft tenants.
pub const MICROSOFT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// The authentication method that issued the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    /// Username/password checked by the backend.
    Local,
    /// Microsoft identity platform (SSO).
    Microsoft,
}

impl AuthProviderKind {
    /// Wire value used in storage and in the `X-Auth-Provider` header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for AuthProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "microsoft" => Ok(Self::Microsoft),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// A bearer token together with the provider that issued it.
///
/// A credential is always complete: there is no way to build one without
/// both halves, so "token but no provider" can only exist in raw storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque bearer token.
    pub token: String,
    /// Issuing provider.
    pub provider: AuthProviderKind,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(token: impl Into<String>, provider: AuthProviderKind) -> Self {
        Self {
            token: token.into(),
            provider,
        }
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Get a preview of a token (at most the first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(8).collect();
    format!("{head}...")
}

/// Login methods currently enabled on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviderCapabilities {
    /// Username/password login is offered.
    #[serde(rename = "Local")]
    pub local_enabled: bool,
    /// Microsoft sign-in is offered.
    #[serde(rename = "Microsoft")]
    pub microsoft_enabled: bool,
}

impl AuthProviderCapabilities {
    /// Capabilities used when the probe itself failed: every option is shown.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            local_enabled: true,
            microsoft_enabled: true,
        }
    }

    /// Login options the UI should offer, in display order.
    #[must_use]
    pub fn login_options(&self) -> Vec<AuthProviderKind> {
        let mut options = Vec::with_capacity(2);
        if self.local_enabled {
            options.push(AuthProviderKind::Local);
        }
        if self.microsoft_enabled {
            options.push(AuthProviderKind::Microsoft);
        }
        options
    }

    /// Returns true if the given provider may be offered.
    #[must_use]
    pub const fn offers(&self, provider: AuthProviderKind) -> bool {
        match provider {
            AuthProviderKind::Local => self.local_enabled,
            AuthProviderKind::Microsoft => self.microsoft_enabled,
        }
    }
}

/// Tenant settings as returned by `/auth/microsoft`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrosoftAuthSettings {
    /// Application (client) id registered in the tenant.
    #[serde(rename = "ClientID")]
    pub client_id: String,
    /// Directory (tenant) id.
    #[serde(rename = "TenantID")]
    pub tenant_id: String,
}

/// Configuration handed to the identity client constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrosoftTenantConfig {
    /// Application (client) id.
    pub client_id: String,
    /// `https://login.microsoftonline.com/{tenant_id}`
    pub authority: String,
    /// Where the interactive flow returns to.
    pub redirect_uri: Option<String>,
    /// Platform broker support; always off.
    pub allow_native_broker: bool,
}

impl MicrosoftTenantConfig {
    /// Builds the configuration from backend-supplied tenant settings.
    ///
    /// # Errors
    /// Returns an error if the client id or tenant id is blank.
    pub fn from_settings(
        settings: &MicrosoftAuthSettings,
        redirect_uri: Option<String>,
    ) -> Result<Self, DomainError> {
        let client_id = settings.client_id.trim();
        let tenant_id = settings.tenant_id.trim();

        if client_id.is_empty() {
            return Err(DomainError::InvalidTenantSettings(
                "client id is empty".to_string(),
            ));
        }
        if tenant_id.is_empty() {
            return Err(DomainError::InvalidTenantSettings(
                "tenant id is empty".to_string(),
            ));
        }

        Ok(Self {
            client_id: client_id.to_string(),
            authority: format!("{MICROSOFT_AUTHORITY_HOST}/{tenant_id}"),
            redirect_uri,
            allow_native_broker: false,
        })
    }
}

/// Query parameters of the local credential check.
#[derive(Clone, Serialize)]
pub struct AuthRequest {
    /// Login name.
    #[serde(rename = "Username")]
    pub username: String,
    /// Plain text password.
    #[serde(rename = "Password")]
    pub password: String,
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Payload of a successful local credential check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Signed session token.
    #[serde(rename = "Token")]
    pub token: String,
}

/// Result of a silent token request against the identity platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAcquisition {
    /// A fresh identity token.
    Acquired {
        /// The identity token to use as bearer.
        id_token: String,
    },
    /// The cached session cannot be renewed without the user.
    InteractionRequired,
    /// Any other failure.
    Failed {
        /// Reason reported by the identity platform.
        reason: String,
    },
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Probing the enabled login methods failed.
    #[error("could not fetch auth providers: {message}")]
    CapabilityFetch {
        /// Error message
        message: String,
    },

    /// The backend rejected username or password.
    #[error("credentials rejected: {message}")]
    CredentialRejected {
        /// Error message
        message: String,
    },

    /// Silent refresh needs the user to sign in again.
    #[error("user interaction required")]
    InteractionRequired,

    /// The identity platform failed for any other reason.
    #[error("token acquisition failed: {message}")]
    TokenAcquisitionFailed {
        /// Error message
        message: String,
    },

    /// `/user/me` failed after a credential was stored.
    #[error("could not load session profile: {message}")]
    ProfileLoadFailed {
        /// Error message
        message: String,
    },

    /// The backend could not be reached or answered unexpectedly.
    #[error("backend error: {message}")]
    Backend {
        /// Error message
        message: String,
    },

    /// Tenant settings could not be fetched or were invalid.
    #[error("invalid identity configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// The identity client could not be constructed.
    #[error("identity client initialization failed: {message}")]
    IdentityInitialization {
        /// Error message
        message: String,
    },

    /// An identity operation was called before the adapter reached the required state.
    #[error("identity adapter is {state}, expected {expected}")]
    IdentityNotReady {
        /// Current state
        state: &'static str,
        /// Required state
        expected: &'static str,
    },

    /// The durable client storage failed.
    #[error("storage error: {message}")]
    Storage {
        /// Error message
        message: String,
    },
}
