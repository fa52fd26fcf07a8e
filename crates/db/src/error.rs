//! Mapping of database errors onto the core store error.

use coopbank_core::StoreError;
use sea_orm::{DbErr, SqlErr};

/// Converts a `SeaORM` error into the kind the core services understand.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        return StoreError::UniqueViolation(message);
    }
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Unavailable(err.to_string()),
        DbErr::RecordNotFound(message) => StoreError::NotFound(message),
        other => StoreError::Backend(other.to_string()),
    }
}

/// Error for a stored value that no longer decodes into its domain type.
pub(crate) fn corrupt(what: &str, value: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("Corrupt {what}: {value}"))
}

/// Error for a JSON column that failed to (de)serialize.
pub(crate) fn json_error(err: &serde_json::Error) -> StoreError {
    StoreError::Backend(format!("JSON column error: {err}"))
}
