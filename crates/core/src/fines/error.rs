//! Fine resolution error types.

use coopbank_shared::AppError;
use coopbank_shared::types::ArithmeticError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{FineContext, FineFrequency};

/// Errors raised while resolving a fine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FineError {
    /// The selected percentage is outside `[0, 100]`.
    #[error("Invalid fine configuration for {frequency}/{context}: {value}")]
    InvalidConfiguration {
        /// Selected bucket.
        frequency: FineFrequency,
        /// Fine context.
        context: FineContext,
        /// Offending percentage.
        value: Decimal,
    },

    /// Arithmetic failure computing the amount.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl FineError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidConfiguration { .. } => 422,
            Self::Arithmetic(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "INVALID_FINE_CONFIGURATION",
            Self::Arithmetic(_) => "ARITHMETIC_ERROR",
        }
    }
}

impl From<FineError> for AppError {
    fn from(err: FineError) -> Self {
        match err {
            FineError::InvalidConfiguration { .. } => Self::Validation(err.to_string()),
            FineError::Arithmetic(_) => Self::Internal(err.to_string()),
        }
    }
}
