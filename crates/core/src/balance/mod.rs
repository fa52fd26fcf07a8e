//! Per-day ending balances rebuilt from raw ledger deltas.
//!
//! # Modules
//!
//! - `types` - ledger deltas and daily balances
//! - `source` - external ledger delta port
//! - `reconstructor` - `DailyBalanceReconstructor`
//! - `error` - balance error types

pub mod error;
pub mod reconstructor;
pub mod source;
pub mod types;

#[cfg(test)]
mod reconstructor_props;

pub use error::BalanceError;
pub use reconstructor::DailyBalanceReconstructor;
pub use source::LedgerDeltaSource;
pub use types::{DailyBalance, LedgerDelta};
