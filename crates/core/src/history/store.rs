//! Read-side port for account history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coopbank_shared::types::{AccountId, Scope};

use super::types::AccountHistory;
use crate::store::StoreResult;

/// Reads persisted history rows.
///
/// Writes go through [`crate::account::AccountUnit::apply_history`] so they
/// share the mutation's transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryReader: Send + Sync {
    /// All rows for an account, ordered by `valid_from`.
    async fn timeline(&self, account_id: AccountId) -> StoreResult<Vec<AccountHistory>>;

    /// The row whose validity interval contains `at`.
    async fn containing(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AccountHistory>>;

    /// The latest row with `valid_from <= at`.
    async fn latest_at_or_before(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AccountHistory>>;

    /// Rows in a scope whose `valid_from` falls in `[start, end)`.
    async fn changed_in_range(
        &self,
        scope: Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountHistory>>;

    /// Rows in a scope with `valid_from <= until`.
    async fn scope_timeline(
        &self,
        scope: Scope,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountHistory>>;
}
