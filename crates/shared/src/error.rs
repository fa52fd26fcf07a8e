//! Application-wide error types.
//!
//! Every domain error in the workspace maps onto one of these kinds so a
//! caller can tell "fix your input" from "retry later" from "state already
//! changed".

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation before any mutation was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Concurrent modification or uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Illegal lifecycle transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An external collaborator (ledger source, store) was unavailable.
    #[error("Dependency unavailable: {0}")]
    Dependency(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::InvalidState(_) => 409,
            Self::Dependency(_) => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Dependency(_) => "DEPENDENCY_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency(_) | Self::Conflict(_))
    }
}
