//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is terminal from the caller's point of view and maps to a
/// stable machine-readable code at the API boundary. Infrastructure concerns
/// (store conflicts before retry exhaustion, serialization) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure). Maps to the
    /// validation code at the boundary.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The actor is neither the holder nor a circle member of the holder.
    #[error("forbidden")]
    Forbidden,

    /// The actor is a circle member but the holder has not enabled the
    /// requested operation on this account.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A debit would push the account balance below zero.
    #[error("insufficient balance: have {balance}, requested {requested}")]
    InsufficientBalance { balance: i64, requested: i64 },

    /// A referenced client/account/group/member is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency retries were exhausted.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The prospective member already belongs to a family circle.
    #[error("member already belongs to a family circle")]
    MemberAlreadyInCircle,

    /// A holder attempted to add themselves to their own circle.
    #[error("cannot add self to own family circle")]
    CannotAddSelf,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
