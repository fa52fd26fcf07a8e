//! Posting ports and the journal lines a posted entry produces.
//!
//! Posting runs one transaction per (member, account) pair. A pair that
//! fails rolls back alone; pairs already committed stay posted and are
//! skipped when the run is retried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coopbank_shared::types::{AccountId, SavingsInterestEntryId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::types::SavingsInterestEntry;
use crate::guard::RowLock;
use crate::ledger::{EntryType, JournalPosting, LedgerKey, MemberLedger, PostingLine};
use crate::store::StoreResult;

/// Opens per-pair posting transactions.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Begins a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn PostingUnit>>;
}

/// One pair's posting transaction.
///
/// Dropping a unit without [`PostingUnit::commit`] rolls it back.
#[async_trait]
pub trait PostingUnit: RowLock<MemberLedger> + Send {
    /// Marks an entry posted if it is not already.
    ///
    /// Returns `false` when another run posted it first.
    async fn claim_entry(
        &mut self,
        entry_id: SavingsInterestEntryId,
        posted_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Inserts or overwrites the member ledger aggregate.
    async fn save_ledger(&mut self, ledger: &MemberLedger) -> StoreResult<()>;

    /// Appends general-ledger lines.
    async fn append_posting(&mut self, posting: &JournalPosting) -> StoreResult<()>;

    /// Commits every write made through this unit.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// A pair that could not be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairFailure {
    /// The pair.
    pub key: LedgerKey,
    /// Error code of the failure.
    pub error_code: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// Outcome of a post run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostingReport {
    /// Pairs posted by this run.
    pub posted: usize,
    /// Pairs already posted by an earlier run.
    pub skipped: usize,
    /// Pairs that failed and were rolled back.
    pub failures: Vec<PairFailure>,
}

impl PostingReport {
    /// True if every pair is now posted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds the general-ledger lines for one entry.
///
/// Interest debits `post_account_id` and credits the member's account.
/// A negative entry (below-minimum charge) reverses the sides. Withheld tax
/// moves back from the member to `post_account_id`. Zero amounts produce
/// no line.
#[must_use]
pub fn posting_lines(entry: &SavingsInterestEntry, post_account_id: AccountId) -> Vec<PostingLine> {
    let member = Some(entry.key.member_profile_id);
    let mut lines = Vec::with_capacity(4);

    let interest = entry.interest_amount;
    if !interest.is_zero() {
        let (expense_side, member_side, memo) = if interest > Decimal::ZERO {
            (EntryType::Debit, EntryType::Credit, "Savings interest")
        } else {
            (EntryType::Credit, EntryType::Debit, "Below minimum balance charge")
        };
        let amount = interest.abs();
        lines.push(PostingLine {
            account_id: post_account_id,
            member_profile_id: None,
            entry_type: expense_side,
            amount,
            memo: memo.to_owned(),
        });
        lines.push(PostingLine {
            account_id: entry.key.account_id,
            member_profile_id: member,
            entry_type: member_side,
            amount,
            memo: memo.to_owned(),
        });
    }

    if entry.interest_tax > Decimal::ZERO {
        lines.push(PostingLine {
            account_id: entry.key.account_id,
            member_profile_id: member,
            entry_type: EntryType::Debit,
            amount: entry.interest_tax,
            memo: "Interest withholding tax".to_owned(),
        });
        lines.push(PostingLine {
            account_id: post_account_id,
            member_profile_id: None,
            entry_type: EntryType::Credit,
            amount: entry.interest_tax,
            memo: "Interest withholding tax".to_owned(),
        });
    }

    lines
}
