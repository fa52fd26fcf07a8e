//! In-memory port implementations for service tests.
//!
//! One mutex guards the whole state. A unit of work holds the lock for its
//! lifetime and writes to a staged copy; commit swaps the copy in and drop
//! discards it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use coopbank_shared::types::{
    AccountHistoryId, AccountId, MemberProfileId, MemberTypeId, SavingsInterestBatchId,
    SavingsInterestEntryId, Scope, UserId,
};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::account::{AccountConfiguration, AccountRecord, AccountStore, AccountUnit};
use crate::balance::{LedgerDelta, LedgerDeltaSource};
use crate::guard::RowLock;
use crate::history::{AccountHistory, HistoryChangeType, HistoryReader, HistoryWrite, timeline};
use crate::ledger::{JournalPosting, LedgerKey, MemberLedger};
use crate::savings::{
    BatchAction, BatchFilter, BatchStatus, BatchStore, BatchTotals, EligibilitySource,
    EligiblePair, MemberTypeHistorySource, PostingStore, PostingUnit, SavingsInterestBatch,
    SavingsInterestEntry,
};
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: BTreeMap<AccountId, AccountRecord>,
    history: Vec<AccountHistory>,
    ledgers: BTreeMap<LedgerKey, MemberLedger>,
    postings: Vec<JournalPosting>,
    batches: BTreeMap<SavingsInterestBatchId, SavingsInterestBatch>,
    pairs: Vec<EligiblePair>,
    openings: BTreeMap<LedgerKey, Decimal>,
    deltas: BTreeMap<LedgerKey, Vec<LedgerDelta>>,
    member_since: BTreeMap<(MemberProfileId, MemberTypeId), NaiveDate>,
    failing_sources: BTreeSet<LedgerKey>,
    failing_ledgers: BTreeSet<LedgerKey>,
}

/// Shared in-memory store implementing every port.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a `Created` history row starting at `valid_from`.
    pub async fn seed_history(&self, config: AccountConfiguration, valid_from: DateTime<Utc>) {
        self.state.lock().await.history.push(AccountHistory {
            id: AccountHistoryId::new(),
            account_id: config.account_id,
            scope: config.scope,
            change_type: HistoryChangeType::Created,
            snapshot: config,
            valid_from,
            valid_to: None,
            recorded_by: UserId::new(),
        });
    }

    pub async fn seed_pair(&self, pair: EligiblePair) {
        self.state.lock().await.pairs.push(pair);
    }

    pub async fn seed_opening(&self, key: LedgerKey, balance: Decimal) {
        self.state.lock().await.openings.insert(key, balance);
    }

    /// Adds a delta recorded at midnight of its entry date.
    pub async fn seed_delta(&self, key: LedgerKey, entry_date: NaiveDate, amount: Decimal) {
        let recorded_at = Utc.from_utc_datetime(&entry_date.and_time(chrono::NaiveTime::MIN));
        self.state
            .lock()
            .await
            .deltas
            .entry(key)
            .or_default()
            .push(LedgerDelta {
                entry_date,
                amount,
                recorded_at,
            });
    }

    /// Makes every delta read for `key` fail as unavailable.
    pub async fn fail_source_for(&self, key: LedgerKey) {
        self.state.lock().await.failing_sources.insert(key);
    }

    /// Makes every ledger lock for `key` fail as unavailable.
    pub async fn fail_ledger_for(&self, key: LedgerKey) {
        self.state.lock().await.failing_ledgers.insert(key);
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.failing_sources.clear();
        state.failing_ledgers.clear();
    }

    /// Records that `member` took `member_type` on `since`.
    pub async fn seed_member_type(
        &self,
        member: MemberProfileId,
        member_type: MemberTypeId,
        since: NaiveDate,
    ) {
        self.state
            .lock()
            .await
            .member_since
            .insert((member, member_type), since);
    }

    /// Stores `ledger`, replacing any aggregate under the same key.
    pub async fn seed_ledger(&self, ledger: MemberLedger) {
        self.state.lock().await.ledgers.insert(ledger.key, ledger);
    }

    pub async fn ledger(&self, key: &LedgerKey) -> Option<MemberLedger> {
        self.state.lock().await.ledgers.get(key).cloned()
    }

    pub async fn postings(&self) -> Vec<JournalPosting> {
        self.state.lock().await.postings.clone()
    }

    async fn unit(&self) -> MemoryUnit {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        MemoryUnit { guard, staged }
    }
}

struct MemoryUnit {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

impl MemoryUnit {
    fn finish(self) {
        let Self { mut guard, staged } = self;
        *guard = staged;
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn AccountUnit>> {
        Ok(Box::new(self.unit().await))
    }

    async fn find(&self, account_id: AccountId) -> StoreResult<Option<AccountRecord>> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn list(&self, scope: Scope) -> StoreResult<Vec<AccountRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<AccountRecord> = state
            .accounts
            .values()
            .filter(|record| record.configuration.scope == scope && !record.is_deleted())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.configuration.name.cmp(&b.configuration.name));
        Ok(records)
    }
}

#[async_trait]
impl RowLock<AccountRecord> for MemoryUnit {
    async fn find_for_update(&mut self, key: &AccountId) -> StoreResult<Option<AccountRecord>> {
        Ok(self.staged.accounts.get(key).cloned())
    }
}

#[async_trait]
impl AccountUnit for MemoryUnit {
    async fn name_taken(
        &mut self,
        scope: Scope,
        name: &str,
        excluding: Option<AccountId>,
    ) -> StoreResult<bool> {
        Ok(self.staged.accounts.values().any(|record| {
            !record.is_deleted()
                && record.configuration.scope == scope
                && record.configuration.name == name
                && Some(record.account_id()) != excluding
        }))
    }

    async fn insert(&mut self, record: &AccountRecord) -> StoreResult<()> {
        let id = record.account_id();
        if self.staged.accounts.contains_key(&id) {
            return Err(StoreError::UniqueViolation(id.to_string()));
        }
        self.staged.accounts.insert(id, record.clone());
        Ok(())
    }

    async fn update(&mut self, record: &AccountRecord) -> StoreResult<()> {
        self.staged
            .accounts
            .insert(record.account_id(), record.clone());
        Ok(())
    }

    async fn open_history(&mut self, account_id: AccountId) -> StoreResult<Option<AccountHistory>> {
        Ok(self
            .staged
            .history
            .iter()
            .find(|row| row.account_id == account_id && row.is_open())
            .cloned())
    }

    async fn apply_history(&mut self, write: &HistoryWrite) -> StoreResult<()> {
        if let Some(close) = write.close {
            let row = self
                .staged
                .history
                .iter_mut()
                .find(|row| row.id == close.history_id)
                .ok_or_else(|| StoreError::NotFound(close.history_id.to_string()))?;
            row.valid_to = Some(close.valid_to);
        }
        self.staged.history.push(write.append.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.finish();
        Ok(())
    }
}

#[async_trait]
impl HistoryReader for MemoryStore {
    async fn timeline(&self, account_id: AccountId) -> StoreResult<Vec<AccountHistory>> {
        let state = self.state.lock().await;
        let rows: Vec<AccountHistory> = state
            .history
            .iter()
            .filter(|row| row.account_id == account_id)
            .cloned()
            .collect();
        Ok(timeline::ordered(&rows).into_iter().cloned().collect())
    }

    async fn containing(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AccountHistory>> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .find(|row| row.account_id == account_id && row.contains(at))
            .cloned())
    }

    async fn latest_at_or_before(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AccountHistory>> {
        let rows = self.timeline(account_id).await?;
        Ok(rows.into_iter().rev().find(|row| row.valid_from <= at))
    }

    async fn changed_in_range(
        &self,
        scope: Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountHistory>> {
        let state = self.state.lock().await;
        let rows: Vec<AccountHistory> = state
            .history
            .iter()
            .filter(|row| row.scope == scope)
            .cloned()
            .collect();
        Ok(timeline::changed_in_range(&rows, start, end)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn scope_timeline(
        &self,
        scope: Scope,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountHistory>> {
        let state = self.state.lock().await;
        let rows: Vec<AccountHistory> = state
            .history
            .iter()
            .filter(|row| row.scope == scope && row.valid_from <= until)
            .cloned()
            .collect();
        Ok(timeline::ordered(&rows).into_iter().cloned().collect())
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn insert(&self, batch: &SavingsInterestBatch) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.batches.contains_key(&batch.id) {
            return Err(StoreError::UniqueViolation(batch.id.to_string()));
        }
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn find(&self, id: SavingsInterestBatchId) -> StoreResult<Option<SavingsInterestBatch>> {
        let state = self.state.lock().await;
        Ok(state.batches.get(&id).cloned().map(|mut batch| {
            batch.entries.sort_by_key(|entry| entry.key);
            batch
        }))
    }

    async fn replace_entries(
        &self,
        id: SavingsInterestBatchId,
        entries: &[SavingsInterestEntry],
        totals: BatchTotals,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if batch.status != BatchStatus::Draft {
            return Ok(false);
        }
        batch.entries = entries.to_vec();
        batch.total_interest = totals.total_interest;
        batch.total_tax = totals.total_tax;
        batch.updated_at = updated_at;
        Ok(true)
    }

    async fn transition(
        &self,
        id: SavingsInterestBatchId,
        from: BatchStatus,
        action: &BatchAction,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if batch.status != from {
            return Ok(false);
        }
        batch.status = action.new_status();
        match action {
            BatchAction::Print { stamp, .. } => batch.printed = Some(*stamp),
            BatchAction::Post { stamp, .. } => batch.posted = Some(stamp.clone()),
        }
        Ok(true)
    }
}

#[async_trait]
impl MemberTypeHistorySource for MemoryStore {
    async fn member_type_since(
        &self,
        _scope: Scope,
        member_profile_id: MemberProfileId,
        member_type_id: MemberTypeId,
    ) -> StoreResult<Option<NaiveDate>> {
        let state = self.state.lock().await;
        Ok(state
            .member_since
            .get(&(member_profile_id, member_type_id))
            .copied())
    }
}

#[async_trait]
impl EligibilitySource for MemoryStore {
    async fn eligible_pairs(
        &self,
        scope: Scope,
        _filter: &BatchFilter,
    ) -> StoreResult<Vec<EligiblePair>> {
        let state = self.state.lock().await;
        Ok(state
            .pairs
            .iter()
            .filter(|pair| pair.key.scope == scope)
            .map(|pair| EligiblePair {
                ledger_id: state.ledgers.get(&pair.key).map(|ledger| ledger.id),
                ..*pair
            })
            .collect())
    }
}

#[async_trait]
impl LedgerDeltaSource for MemoryStore {
    async fn opening_balance(&self, key: &LedgerKey, before: NaiveDate) -> StoreResult<Decimal> {
        let state = self.state.lock().await;
        if state.failing_sources.contains(key) {
            return Err(StoreError::Unavailable(format!("ledger source for {key}")));
        }
        let opening = state.openings.get(key).copied().unwrap_or_default();
        Ok(state
            .deltas
            .get(key)
            .into_iter()
            .flatten()
            .filter(|delta| delta.entry_date < before)
            .fold(opening, |acc, delta| acc + delta.amount))
    }

    async fn fetch_deltas(
        &self,
        key: &LedgerKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LedgerDelta>> {
        let state = self.state.lock().await;
        if state.failing_sources.contains(key) {
            return Err(StoreError::Unavailable(format!("ledger source for {key}")));
        }
        Ok(state
            .deltas
            .get(key)
            .into_iter()
            .flatten()
            .filter(|delta| from <= delta.entry_date && delta.entry_date < to)
            .copied()
            .collect())
    }
}

#[async_trait]
impl PostingStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn PostingUnit>> {
        Ok(Box::new(self.unit().await))
    }
}

#[async_trait]
impl RowLock<MemberLedger> for MemoryUnit {
    async fn find_for_update(&mut self, key: &LedgerKey) -> StoreResult<Option<MemberLedger>> {
        if self.staged.failing_ledgers.contains(key) {
            return Err(StoreError::Unavailable(format!("ledger lock for {key}")));
        }
        Ok(self.staged.ledgers.get(key).cloned())
    }
}

#[async_trait]
impl PostingUnit for MemoryUnit {
    async fn claim_entry(
        &mut self,
        entry_id: SavingsInterestEntryId,
        posted_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let entry = self
            .staged
            .batches
            .values_mut()
            .flat_map(|batch| batch.entries.iter_mut())
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| StoreError::NotFound(entry_id.to_string()))?;
        if entry.posted_at.is_some() {
            return Ok(false);
        }
        entry.posted_at = Some(posted_at);
        Ok(true)
    }

    async fn save_ledger(&mut self, ledger: &MemberLedger) -> StoreResult<()> {
        self.staged.ledgers.insert(ledger.key, ledger.clone());
        Ok(())
    }

    async fn append_posting(&mut self, posting: &JournalPosting) -> StoreResult<()> {
        self.staged.postings.push(posting.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.finish();
        Ok(())
    }
}
