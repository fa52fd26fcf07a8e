//! Persistence ports for account configurations.

use async_trait::async_trait;
use coopbank_shared::types::{AccountId, Scope};

use super::types::AccountRecord;
use crate::guard::RowLock;
use crate::history::{AccountHistory, HistoryWrite};
use crate::store::StoreResult;

/// Opens account units of work and serves plain reads.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Begins a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn AccountUnit>>;

    /// Reads an account without locking. Deleted records are included.
    async fn find(&self, account_id: AccountId) -> StoreResult<Option<AccountRecord>>;

    /// Lists live accounts in a scope, ordered by name.
    async fn list(&self, scope: Scope) -> StoreResult<Vec<AccountRecord>>;
}

/// One account transaction.
///
/// Dropping a unit without [`AccountUnit::commit`] rolls it back.
#[async_trait]
pub trait AccountUnit: RowLock<AccountRecord> + Send {
    /// True if a live account in `scope` already uses `name`.
    async fn name_taken(
        &mut self,
        scope: Scope,
        name: &str,
        excluding: Option<AccountId>,
    ) -> StoreResult<bool>;

    /// Inserts a new record.
    async fn insert(&mut self, record: &AccountRecord) -> StoreResult<()>;

    /// Overwrites an existing record.
    async fn update(&mut self, record: &AccountRecord) -> StoreResult<()>;

    /// The account's open history row, read under the row lock.
    async fn open_history(&mut self, account_id: AccountId) -> StoreResult<Option<AccountHistory>>;

    /// Applies a planned close/append pair.
    async fn apply_history(&mut self, write: &HistoryWrite) -> StoreResult<()>;

    /// Commits every write made through this unit.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
