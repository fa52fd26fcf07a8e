//! External ledger delta port.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::LedgerDelta;
use crate::ledger::LedgerKey;
use crate::store::StoreResult;

/// Supplies raw ledger movements for one (member, account) pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerDeltaSource: Send + Sync {
    /// Balance at the end of the day before `before`, zero if none.
    async fn opening_balance(&self, key: &LedgerKey, before: NaiveDate) -> StoreResult<Decimal>;

    /// Deltas dated in `[from, to)`.
    async fn fetch_deltas(
        &self,
        key: &LedgerKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LedgerDelta>>;
}
