//! Authentication and session core.
//!
//! This module provides:
//! - Durable credential storage shared by both login methods
//! - Probing of the login methods the backend offers
//! - The Microsoft identity adapter and its single-flight refresh
//! - Login orchestration and the cached session profile
//! - Per-request credential injection

mod context;
mod credential_store;
mod interceptor;
mod microsoft;
mod provider_registry;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{AuthContext, BootMode, BootReport};
pub use credential_store::{ACCESS_TOKEN_KEY, AUTH_PROVIDER_KEY, CredentialStore, SESSION_KEY};
pub use interceptor::RequestAuthInterceptor;
pub use microsoft::{AdapterState, MicrosoftIdentityAdapter, RefreshOutcome};
pub use provider_registry::AuthProviderRegistry;
pub use session::{LoginMethod, LoginOutcome, SessionManager};
