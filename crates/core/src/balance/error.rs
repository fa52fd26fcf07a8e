//! Balance reconstruction error types.

use chrono::NaiveDate;
use coopbank_shared::AppError;
use coopbank_shared::types::ArithmeticError;
use thiserror::Error;

use crate::ledger::LedgerKey;

/// Errors raised while reconstructing a daily balance series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// `to` is before `from`.
    #[error("Invalid balance range: {from} to {to}")]
    InvalidRange {
        /// Range start.
        from: NaiveDate,
        /// Range end, exclusive.
        to: NaiveDate,
    },

    /// The source returned a delta outside the requested range.
    #[error("Delta dated {date} outside [{from}, {to})")]
    DeltaOutOfRange {
        /// Delta date.
        date: NaiveDate,
        /// Range start.
        from: NaiveDate,
        /// Range end, exclusive.
        to: NaiveDate,
    },

    /// The ledger source failed.
    #[error("Ledger source unavailable for {key} from {date}: {message}")]
    Dependency {
        /// Pair being reconstructed.
        key: LedgerKey,
        /// First date of the failed request.
        date: NaiveDate,
        /// Source error message.
        message: String,
    },

    /// Arithmetic failure.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl BalanceError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRange { .. } => 400,
            Self::Dependency { .. } => 503,
            Self::DeltaOutOfRange { .. } | Self::Arithmetic(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "INVALID_BALANCE_RANGE",
            Self::DeltaOutOfRange { .. } => "DELTA_OUT_OF_RANGE",
            Self::Dependency { .. } => "LEDGER_SOURCE_UNAVAILABLE",
            Self::Arithmetic(_) => "ARITHMETIC_ERROR",
        }
    }
}

impl From<BalanceError> for AppError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InvalidRange { .. } => Self::Validation(err.to_string()),
            BalanceError::Dependency { .. } => Self::Dependency(err.to_string()),
            BalanceError::DeltaOutOfRange { .. } | BalanceError::Arithmetic(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
