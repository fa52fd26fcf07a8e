//! Ledger keys and posting lines.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use coopbank_shared::types::{AccountId, MemberProfileId, Scope, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one member's ledger for one account.
///
/// Ordering is `(account_id, member_profile_id, scope)`, the global lock
/// acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    /// Owning scope.
    pub scope: Scope,
    /// The account the ledger tracks.
    pub account_id: AccountId,
    /// The member the ledger belongs to.
    pub member_profile_id: MemberProfileId,
}

impl LedgerKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(scope: Scope, account_id: AccountId, member_profile_id: MemberProfileId) -> Self {
        Self {
            scope,
            account_id,
            member_profile_id,
        }
    }
}

impl Ord for LedgerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.account_id
            .cmp(&other.account_id)
            .then_with(|| self.member_profile_id.cmp(&other.member_profile_id))
            .then_with(|| self.scope.cmp(&other.scope))
    }
}

impl PartialOrd for LedgerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "account {} member {} ({})",
            self.account_id, self.member_profile_id, self.scope
        )
    }
}

labeled_enum! {
    /// Side of a posting line.
    pub enum EntryType {
        /// Debit side.
        Debit => "debit",
        /// Credit side.
        Credit => "credit",
    }
}

labeled_enum! {
    /// The process that produced a journal posting.
    pub enum PostingSource {
        /// Savings interest batch posting.
        SavingsInterest => "savings_interest",
    }
}

/// One side of a journal posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// Account debited or credited.
    pub account_id: AccountId,
    /// Member subsidiary, when the line hits a member ledger.
    pub member_profile_id: Option<MemberProfileId>,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text description.
    pub memo: String,
}

impl PostingLine {
    /// Returns `(debit, credit)` columns for this line.
    #[must_use]
    pub fn columns(&self) -> (Decimal, Decimal) {
        match self.entry_type {
            EntryType::Debit => (self.amount, Decimal::ZERO),
            EntryType::Credit => (Decimal::ZERO, self.amount),
        }
    }
}

/// A balanced set of posting lines written in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalPosting {
    /// Owning scope.
    pub scope: Scope,
    /// Accounting date of the lines.
    pub entry_date: NaiveDate,
    /// Originating process.
    pub source: PostingSource,
    /// Identifier of the originating record (batch id).
    pub reference_id: Uuid,
    /// Optional check voucher number.
    pub check_voucher_number: Option<String>,
    /// User who posted.
    pub posted_by: UserId,
    /// The lines.
    pub lines: Vec<PostingLine>,
}
