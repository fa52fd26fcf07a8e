//! Concurrency guard error types.

use coopbank_shared::AppError;
use thiserror::Error;

use super::lock::LockIdentity;
use crate::store::StoreError;

/// Errors raised while acquiring a guarded row lock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// No row exists for the key.
    #[error("Locked row not found: {0}")]
    NotFound(String),

    /// The row's immutable identity changed since it was last read.
    #[error("Row was modified by another transaction: expected {expected}, found {found}")]
    Conflict {
        /// Identity of the earlier snapshot.
        expected: LockIdentity,
        /// Identity of the locked row.
        found: LockIdentity,
    },

    /// The store failed while locking.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GuardError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict { .. } => 409,
            Self::Store(StoreError::Unavailable(_)) => 503,
            Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "LOCKED_ROW_NOT_FOUND",
            Self::Conflict { .. } => "CONCURRENT_MODIFICATION",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::NotFound(msg) => Self::NotFound(msg),
            GuardError::Conflict { .. } => Self::Conflict(err.to_string()),
            GuardError::Store(store) => store.into(),
        }
    }
}
