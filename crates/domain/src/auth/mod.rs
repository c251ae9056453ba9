//! Authentication domain types

mod types;

pub use types::{
    AuthError, AuthProviderCapabilities, AuthProviderKind, AuthRequest, AuthResponse,
    Credential, IDENTITY_SCOPES, MICROSOFT_AUTHORITY_HOST, MicrosoftAuthSettings,
    MicrosoftTenantConfig, TokenAcquisition, token_preview,
};
