//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// One variant per failure class a caller can observe. Transport adapters map
/// these onto status codes; nothing here knows about HTTP.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input. Rejected before storage is touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, invalid or expired credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but the role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with current state (duplicate email, out of stock).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage or other unexpected failure. The message is for operators only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code, used in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::Unauthenticated(_) => "unauthenticated",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::Internal(_) => "internal_error",
        }
    }

    /// The message without the category prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(m)
            | DomainError::Unauthenticated(m)
            | DomainError::Forbidden(m)
            | DomainError::NotFound(m)
            | DomainError::Conflict(m)
            | DomainError::Internal(m) => m,
        }
    }
}
