//! The error taxonomy of `spec.md` §7, surfaced uniformly by every public
//! operation in the workspace.

use thiserror::Error;

/// Result type used across the core.
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Referenced entity missing (product, submission, order, company, ...).
    #[error("not found: {0}")]
    NotFound(String),

    /// State-machine violation: a second pending submission for the same key,
    /// approving a non-pending submission, completing a non-pending order.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Tenant isolation or role policy rejects the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Constraint violation at input (negative quantity, unknown unit,
    /// missing reject reason, empty item list, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A database constraint violation surfaced as a core error.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The ambient deadline for the operation expired.
    #[error("timed out")]
    Timeout,

    /// Unexpected failure. Logged with context; surfaced to callers as opaque,
    /// per §7 ("reported as \"internal error\" with a correlation id").
    #[error("internal error ({correlation_id})")]
    Internal { correlation_id: String },
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Build an `Internal` error, logging the real cause at the call site so
    /// it isn't lost behind the opaque correlation id returned to callers.
    pub fn internal(correlation_id: impl Into<String>, cause: impl core::fmt::Display) -> Self {
        let correlation_id = correlation_id.into();
        tracing::error!(correlation_id = %correlation_id, %cause, "internal error");
        Self::Internal { correlation_id }
    }
}
