//! Ledger error types.
//!
//! Every kind except `Internal` and `Store` is something the caller can fix
//! and carries a reason for them.

use tally_shared::AppError;
use tally_shared::types::CurrencyCode;
use thiserror::Error;
use uuid::Uuid;

use crate::currency::CurrencyError;

/// Failure reported by a ledger store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend aborted the unit of work because of a concurrent writer.
    #[error("Concurrent modification detected, please retry: {0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("Ledger store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if replaying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("account", "transaction", ...).
        entity: &'static str,
        /// The missing ID.
        id: Uuid,
    },

    /// The legitimacy guard rejected the actor.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The request breaks a ledger rule.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// No exchange rate path exists between the two currencies.
    #[error("No exchange rate found for {from}/{to}")]
    RateNotFound {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// Stored data violates a ledger invariant.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The store backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Shorthand for `NotFound`.
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for `InvalidOperation`.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::RateNotFound { .. } => "RATE_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true if the caller can act on this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal(_) | Self::Store(_))
    }

    /// Returns true if the operation may succeed when replayed unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<CurrencyError> for LedgerError {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::RateNotFound { from, to } => Self::RateNotFound { from, to },
            CurrencyError::Overflow { .. } => Self::InvalidOperation(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { .. } => Self::NotFound(err.to_string()),
            LedgerError::AccessDenied(reason) => Self::Forbidden(reason),
            LedgerError::InvalidOperation(_) | LedgerError::RateNotFound { .. } => {
                Self::BusinessRule(err.to_string())
            }
            LedgerError::Internal(reason) => Self::Internal(reason),
            LedgerError::Store(store) => Self::Database(store.to_string()),
        }
    }
}
