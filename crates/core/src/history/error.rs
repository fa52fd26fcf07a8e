//! History error types.

use chrono::{DateTime, Utc};
use coopbank_shared::AppError;
use coopbank_shared::types::AccountId;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while recording or querying account history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A create was recorded for an account that already has an open row.
    #[error("Account {0} already has history")]
    AlreadyRecorded(AccountId),

    /// An update or delete found no open row to close.
    #[error("Account {0} has no open history row")]
    NoOpenRow(AccountId),

    /// Prior and new snapshots belong to different accounts.
    #[error("History snapshot mismatch: expected account {expected}, found {found}")]
    AccountMismatch {
        /// Account being recorded.
        expected: AccountId,
        /// Account on the other snapshot.
        found: AccountId,
    },

    /// No snapshot at or before the requested time.
    #[error("No history for account {account_id} at {at}")]
    NotFound {
        /// Account queried.
        account_id: AccountId,
        /// Requested timestamp.
        at: DateTime<Utc>,
    },

    /// Range query with `end < start`.
    #[error("Invalid history range: {start} to {end}")]
    InvalidRange {
        /// Range start.
        start: DateTime<Utc>,
        /// Range end.
        end: DateTime<Utc>,
    },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HistoryError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::AccountMismatch { .. } | Self::InvalidRange { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::AlreadyRecorded(_) | Self::NoOpenRow(_) => 409,
            Self::Store(StoreError::Unavailable(_)) => 503,
            Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyRecorded(_) => "HISTORY_ALREADY_RECORDED",
            Self::NoOpenRow(_) => "HISTORY_NO_OPEN_ROW",
            Self::AccountMismatch { .. } => "HISTORY_ACCOUNT_MISMATCH",
            Self::NotFound { .. } => "HISTORY_NOT_FOUND",
            Self::InvalidRange { .. } => "INVALID_HISTORY_RANGE",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            HistoryError::AccountMismatch { .. } | HistoryError::InvalidRange { .. } => {
                Self::Validation(err.to_string())
            }
            HistoryError::AlreadyRecorded(_) | HistoryError::NoOpenRow(_) => {
                Self::InvalidState(err.to_string())
            }
            HistoryError::Store(store) => store.into(),
        }
    }
}
