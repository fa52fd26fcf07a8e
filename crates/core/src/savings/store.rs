//! Persistence ports for savings interest batches.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use coopbank_shared::types::{MemberProfileId, MemberTypeId, SavingsInterestBatchId, Scope};
use rust_decimal::Decimal;

use super::lifecycle::BatchAction;
use super::types::{
    BatchFilter, BatchStatus, EligiblePair, SavingsInterestBatch, SavingsInterestEntry,
};
use crate::store::StoreResult;

/// Replacement totals written with a recomputed entry set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTotals {
    /// Sum of entry interest.
    pub total_interest: Decimal,
    /// Sum of entry tax.
    pub total_tax: Decimal,
}

/// Stores batches and their entries.
///
/// Status changes are compare-and-set: each write names the status it
/// expects, and returns `false` when the row has moved on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Inserts a batch together with its entries.
    async fn insert(&self, batch: &SavingsInterestBatch) -> StoreResult<()>;

    /// Loads a batch and its entries, entries in `(account, member)` order.
    async fn find(&self, id: SavingsInterestBatchId) -> StoreResult<Option<SavingsInterestBatch>>;

    /// Replaces the entry set of a Draft batch.
    ///
    /// Returns `false` when the batch is no longer Draft.
    async fn replace_entries(
        &self,
        id: SavingsInterestBatchId,
        entries: &[SavingsInterestEntry],
        totals: BatchTotals,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Applies a lifecycle transition if the batch is still in `from`.
    async fn transition(
        &self,
        id: SavingsInterestBatchId,
        from: BatchStatus,
        action: &BatchAction,
    ) -> StoreResult<bool>;
}

/// Lists the (member, account) pairs a batch may cover.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EligibilitySource: Send + Sync {
    /// Pairs with a savings ledger in `scope`.
    ///
    /// Implementations may pre-filter by `filter`; callers apply it again.
    async fn eligible_pairs(
        &self,
        scope: Scope,
        filter: &BatchFilter,
    ) -> StoreResult<Vec<EligiblePair>>;
}

/// Reads when members took their member types.
///
/// Consulted only for products whose rate tiers are keyed by membership
/// year or date.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberTypeHistorySource: Send + Sync {
    /// Day of the latest change that gave the member `member_type_id`, or
    /// `None` when no such change is recorded.
    async fn member_type_since(
        &self,
        scope: Scope,
        member_profile_id: MemberProfileId,
        member_type_id: MemberTypeId,
    ) -> StoreResult<Option<NaiveDate>>;
}
