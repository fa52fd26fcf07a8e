//! Savings interest batch error types.

use coopbank_shared::AppError;
use coopbank_shared::types::{ArithmeticError, SavingsInterestBatchId, Scope};
use thiserror::Error;

use super::types::BatchStatus;
use crate::balance::BalanceError;
use crate::guard::GuardError;
use crate::history::HistoryError;
use crate::ledger::LedgerError;
use crate::store::StoreError;

/// Errors raised by batch computation and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SavingsError {
    /// Batch parameters failed validation.
    #[error("Invalid batch parameters: {0}")]
    InvalidParams(String),

    /// Unknown methodology label.
    #[error("Unknown savings computation type: {0}")]
    UnknownMethodology(String),

    /// Batch not found.
    #[error("Savings interest batch {0} not found")]
    NotFound(SavingsInterestBatchId),

    /// The batch belongs to another scope.
    #[error("Batch belongs to scope {batch}, actor is in {actor}")]
    ScopeMismatch {
        /// Batch scope.
        batch: Scope,
        /// Actor scope.
        actor: Scope,
    },

    /// Illegal lifecycle transition.
    #[error("Invalid batch transition from {from} to {to}")]
    InvalidState {
        /// Current status.
        from: BatchStatus,
        /// Attempted status.
        to: BatchStatus,
    },

    /// Batch status changed between read and write.
    #[error("Batch {0} was modified concurrently")]
    ConcurrentTransition(SavingsInterestBatchId),

    /// Reconstruction failed.
    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// Configuration resolution failed.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Lock failed.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// Posting lines did not balance.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Arithmetic failure.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SavingsError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidParams(_) | Self::UnknownMethodology(_) | Self::ScopeMismatch { .. } => {
                400
            }
            Self::NotFound(_) => 404,
            Self::InvalidState { .. } | Self::ConcurrentTransition(_) => 409,
            Self::Balance(err) => err.status_code(),
            Self::History(err) => err.status_code(),
            Self::Guard(err) => err.status_code(),
            Self::Store(StoreError::Unavailable(_)) => 503,
            Self::Ledger(_) | Self::Arithmetic(_) | Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParams(_) => "INVALID_BATCH_PARAMS",
            Self::UnknownMethodology(_) => "UNKNOWN_COMPUTATION_TYPE",
            Self::NotFound(_) => "BATCH_NOT_FOUND",
            Self::ScopeMismatch { .. } => "SCOPE_MISMATCH",
            Self::InvalidState { .. } => "INVALID_BATCH_STATE",
            Self::ConcurrentTransition(_) => "CONCURRENT_MODIFICATION",
            Self::Balance(err) => err.error_code(),
            Self::History(err) => err.error_code(),
            Self::Guard(err) => err.error_code(),
            Self::Ledger(_) => "UNBALANCED_POSTING",
            Self::Arithmetic(_) => "ARITHMETIC_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<SavingsError> for AppError {
    fn from(err: SavingsError) -> Self {
        match err {
            SavingsError::InvalidParams(_)
            | SavingsError::UnknownMethodology(_)
            | SavingsError::ScopeMismatch { .. } => Self::Validation(err.to_string()),
            SavingsError::NotFound(_) => Self::NotFound(err.to_string()),
            SavingsError::InvalidState { .. } => Self::InvalidState(err.to_string()),
            SavingsError::ConcurrentTransition(_) => Self::Conflict(err.to_string()),
            SavingsError::Balance(inner) => inner.into(),
            SavingsError::History(inner) => inner.into(),
            SavingsError::Guard(inner) => inner.into(),
            SavingsError::Store(inner) => inner.into(),
            SavingsError::Ledger(_) | SavingsError::Arithmetic(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
