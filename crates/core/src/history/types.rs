//! History rows and planned history writes.

use chrono::{DateTime, Utc};
use coopbank_shared::types::{AccountHistoryId, AccountId, Scope, UserId};
use serde::{Deserialize, Serialize};

use crate::account::AccountConfiguration;

labeled_enum! {
    /// The mutation a history row records.
    pub enum HistoryChangeType {
        /// Account created.
        Created => "created",
        /// Configuration changed.
        Updated => "updated",
        /// Account soft-deleted.
        Deleted => "deleted",
    }
}

/// An immutable point-in-time copy of an account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHistory {
    /// Row id.
    pub id: AccountHistoryId,
    /// Account the snapshot belongs to.
    pub account_id: AccountId,
    /// Scope of the account.
    pub scope: Scope,
    /// Mutation recorded.
    pub change_type: HistoryChangeType,
    /// Full configuration as of `valid_from`.
    pub snapshot: AccountConfiguration,
    /// Start of validity, inclusive.
    pub valid_from: DateTime<Utc>,
    /// End of validity, exclusive. `None` while this is the current row.
    pub valid_to: Option<DateTime<Utc>>,
    /// User whose mutation produced the row.
    pub recorded_by: UserId,
}

impl AccountHistory {
    /// Returns true if the row has no successor yet.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }

    /// Returns true if `at` falls in `[valid_from, valid_to)`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && self.valid_to.is_none_or(|end| at < end)
    }
}

/// Closes the currently open row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOpenRow {
    /// Row to close.
    pub history_id: AccountHistoryId,
    /// New `valid_to`.
    pub valid_to: DateTime<Utc>,
}

/// The history side effects of one account mutation.
///
/// Applied in the same transaction as the mutation: the close first, then
/// the append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWrite {
    /// Row to close, absent on create.
    pub close: Option<CloseOpenRow>,
    /// Row to append.
    pub append: AccountHistory,
}
