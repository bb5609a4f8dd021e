//! Error taxonomy for template mutations and persistence.

use crate::element::EditOp;
use thiserror::Error;

/// Errors returned synchronously by template and tree operations.
///
/// Every variant maps to a distinct user-facing message. The operation that
/// produced the error is all-or-nothing: on failure nothing was mutated.
#[derive(Debug, Error)]
pub enum DesignError {
    /// Malformed element properties (negative size, opacity out of range, ...).
    #[error("invalid value: {0}")]
    Validation(String),

    /// A capability flag forbids the requested mutation for this actor.
    #[error("this element does not allow {0}")]
    PermissionDenied(EditOp),

    /// A per-type quota would be exceeded.
    #[error("no more {kind} elements can be added (limit: {limit})")]
    QuotaExceeded { kind: &'static str, limit: u32 },

    /// The persisted template document is malformed and cannot be opened.
    #[error("template document could not be read: {0}")]
    Serialization(String),
}

/// Result type for design operations.
pub type DesignResult<T> = Result<T, DesignError>;

impl DesignError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DesignError::Validation(msg.into())
    }
}
