//! Backend API port

use async_trait::async_trait;

use beetime_domain::{
    AuthProviderCapabilities, AuthRequest, AuthResponse, MicrosoftAuthSettings, SessionProfile,
};

/// Errors returned by the backend API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered 401.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Envelope message or status text
        message: String,
    },

    /// The backend answered with another non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Envelope message or status text
        message: String,
    },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the expected envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The client is not set up to reach a backend, e.g. a malformed base URL.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl BackendError {
    /// HTTP status of the reply, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::InvalidResponse(_) | Self::InvalidConfiguration(_) => None,
        }
    }
}

/// The backend endpoints this client consumes.
///
/// Implementations attach credentials to every call through
/// [`RequestAuthInterceptor`](crate::auth::RequestAuthInterceptor).
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `GET /auth/providers`
    async fn auth_providers(&self) -> Result<AuthProviderCapabilities, BackendError>;

    /// `GET /auth/microsoft`
    async fn microsoft_settings(&self) -> Result<MicrosoftAuthSettings, BackendError>;

    /// `GET /auth?Username=..&Password=..`
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, BackendError>;

    /// `GET /user/me`
    async fn current_user(&self) -> Result<SessionProfile, BackendError>;
}
