//! Member ledger aggregates and general-ledger posting lines.
//!
//! This module is not a double-entry engine. It holds the pieces the savings
//! batch needs to post interest:
//! - `types` - ledger keys, entry sides, posting lines
//! - `aggregate` - the per (member, account) ledger aggregate
//! - `balance` - normal-balance rules per general-ledger type
//! - `validation` - balanced-lines check

pub mod aggregate;
pub mod balance;
pub mod types;
pub mod validation;

pub use aggregate::MemberLedger;
pub use balance::NormalBalance;
pub use types::{EntryType, JournalPosting, LedgerKey, PostingLine, PostingSource};
pub use validation::{LedgerError, validate_lines};
