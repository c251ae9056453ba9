//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during parsing or validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The stored or received provider name is not known.
    #[error("unknown auth provider: {0}")]
    UnknownProvider(String),

    /// The tenant settings supplied by the backend are unusable.
    #[error("invalid tenant settings: {0}")]
    InvalidTenantSettings(String),

    /// The access level of a profile is not known.
    #[error("unknown access level: {0}")]
    UnknownAccessLevel(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
