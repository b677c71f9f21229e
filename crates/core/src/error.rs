//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// The four leading variants are the caller-visible taxonomy: validation,
/// conflict, not-found, and retryable contention. `Unauthorized` and
/// `Internal` exist for the boundary layers (authz checks, storage faults).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input). Fixable by the
    /// caller resubmitting a corrected request.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A state precondition was violated (e.g. manifest already dispatched,
    /// duplicate unique key, delete-protected reference).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced entity is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Lock/timeout contention. The whole operation is safe to retry from
    /// scratch; nothing partial was committed.
    #[error("retryable: {0}")]
    Retryable(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,

    /// Unexpected storage or invariant fault. Not part of the caller
    /// contract; surfaces as a generic server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
