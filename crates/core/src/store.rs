//! Errors reported by persistence and ledger collaborators.

use coopbank_shared::AppError;
use thiserror::Error;

/// Result type for collaborator calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a store or ledger source implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A referenced record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The backing service could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Store error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            StoreError::UniqueViolation(msg) => Self::Conflict(msg),
            StoreError::Unavailable(msg) => Self::Dependency(msg),
            StoreError::Backend(msg) => Self::Database(msg),
        }
    }
}
