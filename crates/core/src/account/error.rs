//! Account configuration error types.

use coopbank_shared::AppError;
use chrono::NaiveDate;
use coopbank_shared::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::guard::GuardError;
use crate::history::HistoryError;
use crate::store::StoreError;

/// Errors that can occur while validating or mutating an account configuration.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Name is empty or whitespace.
    #[error("Account name is required")]
    EmptyName,

    /// No currency relation.
    #[error("Account currency is required")]
    MissingCurrency,

    /// A percentage field is outside [0, 100].
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange {
        /// Field path.
        field: String,
        /// Offending value.
        value: Decimal,
    },

    /// A grace period is outside [0, 365].
    #[error("{field} must be between 0 and 365 days, got {value}")]
    GracePeriodOutOfRange {
        /// Field path.
        field: &'static str,
        /// Offending value.
        value: u32,
    },

    /// Cut-off days outside [0, 30].
    #[error("Cut-off days must be between 0 and 30, got {0}")]
    CutoffDaysOutOfRange(u32),

    /// Cut-off months outside [0, 12].
    #[error("Cut-off months must be between 0 and 12, got {0}")]
    CutoffMonthsOutOfRange(u32),

    /// A monetary field is negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount {
        /// Field path.
        field: &'static str,
        /// Offending value.
        value: Decimal,
    },

    /// A rate tier has `from > to` or a negative bound.
    #[error("Invalid rate tier [{from}, {to}]")]
    InvalidRateTier {
        /// Lower bound.
        from: Decimal,
        /// Upper bound.
        to: Decimal,
    },

    /// A year tier ends before it starts.
    #[error("Invalid year tier [{from_year}, {to_year}]")]
    InvalidYearTier {
        /// First year.
        from_year: i32,
        /// Last year.
        to_year: i32,
    },

    /// A date tier ends before it starts.
    #[error("Invalid date tier [{from}, {to}]")]
    InvalidDateTier {
        /// First day.
        from: NaiveDate,
        /// Last day.
        to: NaiveDate,
    },

    /// An identity field cannot change after creation.
    #[error("{0} cannot be changed after creation")]
    ImmutableField(&'static str),

    /// The configuration belongs to a different scope than the actor.
    #[error("Account scope does not match the acting scope")]
    ScopeMismatch,

    /// Name already used in the scope.
    #[error("Account name '{0}' already exists in this branch")]
    DuplicateName(String),

    /// An account with this id already exists.
    #[error("Account {0} already exists")]
    AlreadyExists(AccountId),

    /// No such account.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// The account was soft-deleted.
    #[error("Account {0} has been deleted")]
    AlreadyDeleted(AccountId),

    /// Locking failed.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// History capture failed.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountError {
    /// Returns true for input errors raised before any mutation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyName
                | Self::MissingCurrency
                | Self::PercentageOutOfRange { .. }
                | Self::GracePeriodOutOfRange { .. }
                | Self::CutoffDaysOutOfRange(_)
                | Self::CutoffMonthsOutOfRange(_)
                | Self::NegativeAmount { .. }
                | Self::InvalidRateTier { .. }
                | Self::InvalidYearTier { .. }
                | Self::InvalidDateTier { .. }
                | Self::ImmutableField(_)
                | Self::ScopeMismatch
        )
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            _ if self.is_validation() => 400,
            Self::NotFound(_) => 404,
            Self::DuplicateName(_) | Self::AlreadyExists(_) | Self::AlreadyDeleted(_) => 409,
            Self::Guard(err) => err.status_code(),
            Self::History(err) => err.status_code(),
            _ => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyName => "ACCOUNT_NAME_REQUIRED",
            Self::MissingCurrency => "ACCOUNT_CURRENCY_REQUIRED",
            Self::PercentageOutOfRange { .. } => "PERCENTAGE_OUT_OF_RANGE",
            Self::GracePeriodOutOfRange { .. } => "GRACE_PERIOD_OUT_OF_RANGE",
            Self::CutoffDaysOutOfRange(_) | Self::CutoffMonthsOutOfRange(_) => {
                "CUTOFF_OUT_OF_RANGE"
            }
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::InvalidRateTier { .. }
            | Self::InvalidYearTier { .. }
            | Self::InvalidDateTier { .. } => "INVALID_RATE_TIER",
            Self::ImmutableField(_) => "IMMUTABLE_FIELD",
            Self::ScopeMismatch => "SCOPE_MISMATCH",
            Self::DuplicateName(_) => "DUPLICATE_ACCOUNT_NAME",
            Self::AlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AlreadyDeleted(_) => "ACCOUNT_DELETED",
            Self::Guard(err) => err.error_code(),
            Self::History(err) => err.error_code(),
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        if err.is_validation() {
            return Self::Validation(err.to_string());
        }
        match err {
            AccountError::NotFound(_) => Self::NotFound(err.to_string()),
            AccountError::DuplicateName(_) | AccountError::AlreadyExists(_) => {
                Self::Conflict(err.to_string())
            }
            AccountError::AlreadyDeleted(_) => Self::InvalidState(err.to_string()),
            AccountError::Guard(inner) => inner.into(),
            AccountError::History(inner) => inner.into(),
            AccountError::Store(inner) => inner.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}
