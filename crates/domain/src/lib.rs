//! BeeTime Domain - Core auth types
//!
//! This crate defines the domain model of the BeeTime auth client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod envelope;
pub mod error;
pub mod profile;
pub mod request;

pub use auth::{
    AuthError, AuthProviderCapabilities, AuthProviderKind, AuthRequest, AuthResponse,
    Credential, IDENTITY_SCOPES, MicrosoftAuthSettings, MicrosoftTenantConfig,
    TokenAcquisition, token_preview,
};
pub use envelope::ApiEnvelope;
pub use error::{DomainError, DomainResult};
pub use profile::{AccessLevel, SessionProfile};
pub use request::{Header, Headers};
