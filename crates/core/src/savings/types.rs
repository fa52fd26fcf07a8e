//! Savings interest batch types.

use chrono::{DateTime, NaiveDate, Utc};
use coopbank_shared::types::{
    AccountId, MemberLedgerId, MemberTypeId, SavingsInterestBatchId, SavingsInterestEntryId,
    Scope, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::ledger::LedgerKey;

labeled_enum! {
    /// How a pair's daily balance series is reduced to an interest base.
    pub enum SavingsComputationType {
        /// Lowest daily ending balance.
        DailyLowestBalance => "daily_lowest_balance",
        /// Mean of daily ending balances.
        AverageDailyBalance => "average_daily_balance",
        /// Lowest of the month-end balances.
        MonthlyEndLowestBalance => "monthly_end_lowest_balance",
        /// Average daily balance, reported with the final balance.
        AdbEndBalance => "adb_end_balance",
        /// Mean of each month's lowest balance.
        MonthlyLowestBalanceAverage => "monthly_lowest_balance_average",
        /// Mean of the month-end balances.
        MonthlyEndBalanceAverage => "monthly_end_balance_average",
        /// Sum of the month-end balances.
        MonthlyEndBalanceTotal => "monthly_end_balance_total",
    }
}

labeled_enum! {
    /// Batch lifecycle state.
    pub enum BatchStatus {
        /// Computed, still mutable.
        Draft => "draft",
        /// Entries frozen.
        Printed => "printed",
        /// Applied to member ledgers.
        Posted => "posted",
    }
}

/// Which pairs a batch covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFilter {
    /// Restrict to one savings account.
    pub account_id: Option<AccountId>,
    /// Restrict to one member type.
    pub member_type_id: Option<MemberTypeId>,
    /// Include pairs whose member account is closed.
    pub include_closed_accounts: bool,
}

impl BatchFilter {
    /// True if `pair` passes the filter.
    #[must_use]
    pub fn admits(&self, pair: &EligiblePair) -> bool {
        self.account_id.is_none_or(|id| id == pair.key.account_id)
            && self
                .member_type_id
                .is_none_or(|id| Some(id) == pair.member_type_id)
            && (self.include_closed_accounts || !pair.closed)
    }
}

/// A (member, account) pair offered for interest computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligiblePair {
    /// Ledger the interest would post to.
    pub key: LedgerKey,
    /// Member's type, when known.
    pub member_type_id: Option<MemberTypeId>,
    /// Existing ledger aggregate, `None` before the first posting.
    pub ledger_id: Option<MemberLedgerId>,
    /// True if the member's account is closed.
    pub closed: bool,
}

/// Inputs of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_period"))]
pub struct CreateBatchParams {
    /// Human-readable document number.
    #[validate(length(min = 1, max = 64))]
    pub document_no: String,
    /// Period start, inclusive.
    pub last_computation_date: NaiveDate,
    /// Period end, exclusive.
    pub new_computation_date: NaiveDate,
    /// Methodology.
    pub computation_type: SavingsComputationType,
    /// Pair filter.
    pub filter: BatchFilter,
    /// On recompute, keep entries already computed and add only missing pairs.
    pub include_existing_computed_interest: bool,
    /// Withholding tax as a fraction of interest, e.g. `0.20`.
    #[validate(custom(function = "validate_tax_rate"))]
    pub interest_tax_rate: Decimal,
}

fn validate_period(params: &CreateBatchParams) -> Result<(), ValidationError> {
    if params.new_computation_date <= params.last_computation_date {
        return Err(ValidationError::new("new_computation_date_not_after_last"));
    }
    Ok(())
}

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO {
        return Err(ValidationError::new("negative_interest_tax_rate"));
    }
    Ok(())
}

/// One computed (member, account) line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsInterestEntry {
    /// Entry id.
    pub id: SavingsInterestEntryId,
    /// Owning batch.
    pub batch_id: SavingsInterestBatchId,
    /// Member ledger the entry posts to.
    pub key: LedgerKey,
    /// Member's type, when known.
    pub member_type_id: Option<MemberTypeId>,
    /// Ledger aggregate seen at computation time.
    pub ledger_id: Option<MemberLedgerId>,
    /// Balance at the end of the period, less any below-minimum charge.
    pub ending_balance: Decimal,
    /// Balance the interest was computed on.
    pub base_amount: Decimal,
    /// Annual rate applied, in percent.
    pub applied_rate: Decimal,
    /// Interest, negative for a below-minimum charge.
    pub interest_amount: Decimal,
    /// Tax withheld.
    pub interest_tax: Decimal,
    /// Set when the entry's posting transaction commits.
    pub posted_at: Option<DateTime<Utc>>,
}

/// Print audit stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintStamp {
    /// Printer.
    pub printed_by: UserId,
    /// Print time.
    pub printed_at: DateTime<Utc>,
}

/// Post audit stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStamp {
    /// Poster.
    pub posted_by: UserId,
    /// Completion time.
    pub posted_at: DateTime<Utc>,
    /// Interest expense account credited against member ledgers.
    pub post_account_id: AccountId,
    /// Optional check voucher number.
    pub check_voucher_number: Option<String>,
    /// Accounting date of the postings.
    pub entry_date: NaiveDate,
}

/// A generated savings interest batch with its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsInterestBatch {
    /// Batch id.
    pub id: SavingsInterestBatchId,
    /// Owning scope.
    pub scope: Scope,
    /// Run inputs.
    pub params: CreateBatchParams,
    /// Lifecycle state.
    pub status: BatchStatus,
    /// Sum of entry interest.
    pub total_interest: Decimal,
    /// Sum of entry tax.
    pub total_tax: Decimal,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last recompute time.
    pub updated_at: DateTime<Utc>,
    /// Set once printed.
    pub printed: Option<PrintStamp>,
    /// Set once posted.
    pub posted: Option<PostStamp>,
    /// Entries in `(account, member)` order.
    pub entries: Vec<SavingsInterestEntry>,
}

/// Options of a post run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostParams {
    /// Interest expense account.
    pub post_account_id: AccountId,
    /// Optional check voucher number.
    pub check_voucher_number: Option<String>,
    /// Accounting date, defaults to the batch's `new_computation_date`.
    pub entry_date: Option<NaiveDate>,
}
