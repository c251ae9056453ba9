//! BeeTime Application - Session core and ports
//!
//! This crate defines the application layer with:
//! - Port traits for client storage, the backend API and the identity SDK
//! - The credential store, provider registry, identity adapter, session
//!   manager and request interceptor
//! - `AuthContext`, which wires them together and runs the boot sequence

pub mod auth;
pub mod ports;

pub use auth::{
    AdapterState, AuthContext, AuthProviderRegistry, BootMode, BootReport, CredentialStore,
    LoginMethod, LoginOutcome, MicrosoftIdentityAdapter, RefreshOutcome, RequestAuthInterceptor,
    SessionManager,
};
pub use ports::{
    BackendApi, BackendError, IdentityClient, IdentityClientFactory, KeyValueStorage,
    MemoryStorage, RedirectResponse, StorageError,
};
