//! Account configuration value object.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use coopbank_shared::types::{AccountId, CurrencyId, Scope, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::{FineContext, FineSchedule, LedgerSourceVisibility};
use crate::guard::{LockIdentity, Lockable};

labeled_enum! {
    /// Loan computation method.
    pub enum ComputationType {
        /// Straight-line installments.
        Straight => "straight",
        /// Interest on the diminishing balance.
        Diminishing => "diminishing",
        /// Diminishing with add-on interest.
        DiminishingAddOn => "diminishing_add_on",
        /// Diminishing, recomputed yearly.
        DiminishingYearly => "diminishing_yearly",
        /// Diminishing principal, straight interest.
        DiminishingStraight => "diminishing_straight",
        /// Diminishing, recomputed quarterly.
        DiminishingQuarterly => "diminishing_quarterly",
    }
}

labeled_enum! {
    /// Functional account type.
    pub enum AccountType {
        /// Savings deposit.
        Deposit => "deposit",
        /// Loan receivable.
        Loan => "loan",
        /// Accounts receivable ledger.
        ArLedger => "ar_ledger",
        /// Accounts receivable aging.
        ArAging => "ar_aging",
        /// Fines income.
        Fines => "fines",
        /// Interest income or expense.
        Interest => "interest",
        /// Stored value facility ledger.
        SvfLedger => "svf_ledger",
        /// Write-off.
        WOff => "w_off",
        /// Accounts payable ledger.
        ApLedger => "ap_ledger",
        /// Anything else.
        Other => "other",
        /// Time deposit.
        TimeDeposit => "time_deposit",
    }
}

labeled_enum! {
    /// Accounting classification.
    pub enum GeneralLedgerType {
        /// Assets.
        Assets => "assets",
        /// Liabilities.
        Liabilities => "liabilities",
        /// Equity.
        Equity => "equity",
        /// Revenue.
        Revenue => "revenue",
        /// Expenses.
        Expenses => "expenses",
    }
}

/// Interest percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRates {
    /// Standard annual rate.
    pub standard: Decimal,
    /// Annual rate for secured balances.
    pub secured: Decimal,
}

/// Base fine percentages per context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineRates {
    /// Late installment fine.
    pub amortization: Decimal,
    /// Past-maturity fine.
    pub maturity: Decimal,
}

impl FineRates {
    /// Returns the base rate for a context.
    #[must_use]
    pub const fn base(&self, context: FineContext) -> Decimal {
        match context {
            FineContext::Amortization => self.amortization,
            FineContext::Maturity => self.maturity,
        }
    }
}

/// Grace periods in days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriods {
    /// Grace after an installment due date.
    pub amortization_days: u32,
    /// Grace after maturity.
    pub maturity_days: u32,
    /// Extra grace added to both contexts.
    pub additional_days: u32,
    /// When set, daily fines accrue without any grace.
    pub no_grace_period_daily: bool,
}

impl GracePeriods {
    /// Returns the context grace plus additional grace.
    #[must_use]
    pub const fn total_for(&self, context: FineContext) -> u32 {
        let base = match context {
            FineContext::Amortization => self.amortization_days,
            FineContext::Maturity => self.maturity_days,
        };
        base.saturating_add(self.additional_days)
    }
}

/// Posting cut-off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cutoff {
    /// Day-of-month cut-off.
    pub days: u32,
    /// Month cut-off.
    pub months: u32,
}

labeled_enum! {
    /// Which tier table overrides the standard savings rate.
    pub enum InterestRateBasis {
        /// Bands of the period's ending balance.
        Amount => "amount",
        /// Ranges of the year the member took their current member type.
        Year => "year",
        /// Ranges of the date the member took their current member type.
        Date => "date",
    }
}

impl Default for InterestRateBasis {
    fn default() -> Self {
        Self::Amount
    }
}

/// A balance band with its own interest rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTier {
    /// Inclusive lower bound.
    pub from: Decimal,
    /// Inclusive upper bound.
    pub to: Decimal,
    /// Annual rate applied inside the band.
    pub rate: Decimal,
}

impl RateTier {
    /// Returns true if `balance` falls inside the band.
    #[must_use]
    pub fn contains(&self, balance: Decimal) -> bool {
        self.from <= balance && balance <= self.to
    }
}

/// A range of membership years, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRateTier {
    /// First year.
    pub from_year: i32,
    /// Last year.
    pub to_year: i32,
    /// Annual rate applied inside the range.
    pub rate: Decimal,
}

impl YearRateTier {
    /// Returns true if `since` falls in one of the covered years.
    #[must_use]
    pub fn contains(&self, since: NaiveDate) -> bool {
        (self.from_year..=self.to_year).contains(&since.year())
    }
}

/// A range of membership dates, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRateTier {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
    /// Annual rate applied inside the range.
    pub rate: Decimal,
}

impl DateRateTier {
    /// Returns true if `since` falls inside the range.
    #[must_use]
    pub fn contains(&self, since: NaiveDate) -> bool {
        self.from <= since && since <= self.to
    }
}

/// Savings interest terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsTerms {
    /// Balance below which no interest is earned.
    pub minimum_balance: Decimal,
    /// Charge levied instead of interest when below the minimum.
    pub below_minimum_charge: Decimal,
    /// Whether interest is subject to withholding tax.
    pub is_taxable: bool,
    /// Tier table consulted by [`SavingsTerms::rate_for`].
    #[serde(default)]
    pub rate_basis: InterestRateBasis,
    /// Amount bands overriding the standard rate.
    #[serde(default)]
    pub rate_tiers: Vec<RateTier>,
    /// Membership year ranges overriding the standard rate.
    #[serde(default)]
    pub year_tiers: Vec<YearRateTier>,
    /// Membership date ranges overriding the standard rate.
    #[serde(default)]
    pub date_tiers: Vec<DateRateTier>,
}

impl SavingsTerms {
    /// Returns the rate for a pair: the first matching tier of the
    /// configured basis, else `standard`.
    ///
    /// `member_since` is the day the member took their current member type;
    /// year and date tiers never match without it.
    #[must_use]
    pub fn rate_for(
        &self,
        balance: Decimal,
        member_since: Option<NaiveDate>,
        standard: Decimal,
    ) -> Decimal {
        let tiered = match self.rate_basis {
            InterestRateBasis::Amount => self
                .rate_tiers
                .iter()
                .find(|tier| tier.contains(balance))
                .map(|tier| tier.rate),
            InterestRateBasis::Year => member_since.and_then(|since| {
                self.year_tiers
                    .iter()
                    .find(|tier| tier.contains(since))
                    .map(|tier| tier.rate)
            }),
            InterestRateBasis::Date => member_since.and_then(|since| {
                self.date_tiers
                    .iter()
                    .find(|tier| tier.contains(since))
                    .map(|tier| tier.rate)
            }),
        };
        tiered.unwrap_or(standard)
    }

    /// Returns true if the rate depends on the member's type history.
    #[must_use]
    pub const fn needs_member_since(&self) -> bool {
        matches!(
            self.rate_basis,
            InterestRateBasis::Year | InterestRateBasis::Date
        )
    }
}

/// The versioned configuration attached to an account.
///
/// History rows hold a full copy of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfiguration {
    /// Account identifier.
    pub account_id: AccountId,
    /// Owning scope.
    pub scope: Scope,
    /// Human-readable name, unique within the scope.
    pub name: String,
    /// Functional type.
    pub account_type: AccountType,
    /// Accounting classification.
    pub general_ledger_type: Option<GeneralLedgerType>,
    /// Loan computation method.
    pub computation_type: ComputationType,
    /// Account currency. Required.
    pub currency_id: Option<CurrencyId>,
    /// Linked loan account, for interest/fines accounts.
    pub loan_account_id: Option<AccountId>,
    /// Interest percentages.
    pub interest: InterestRates,
    /// Base fine percentages.
    pub fines: FineRates,
    /// Grace periods.
    pub grace: GracePeriods,
    /// Posting cut-off.
    pub cutoff: Cutoff,
    /// Fine matrix.
    pub fine_schedule: FineSchedule,
    /// Ledger sources the account is shown for.
    pub ledger_visibility: LedgerSourceVisibility,
    /// Savings interest terms.
    pub savings: SavingsTerms,
}

impl AccountConfiguration {
    /// Creates a configuration with zero rates and default flags.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        scope: Scope,
        name: impl Into<String>,
        account_type: AccountType,
        currency_id: CurrencyId,
    ) -> Self {
        Self {
            account_id,
            scope,
            name: name.into(),
            account_type,
            general_ledger_type: None,
            computation_type: ComputationType::Straight,
            currency_id: Some(currency_id),
            loan_account_id: None,
            interest: InterestRates::default(),
            fines: FineRates::default(),
            grace: GracePeriods::default(),
            cutoff: Cutoff::default(),
            fine_schedule: FineSchedule::default(),
            ledger_visibility: LedgerSourceVisibility::default(),
            savings: SavingsTerms::default(),
        }
    }
}

/// Soft-delete marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    /// Who deleted.
    pub deleted_by: UserId,
    /// When.
    pub deleted_at: DateTime<Utc>,
}

/// The live account row: configuration plus audit stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Current configuration.
    pub configuration: AccountConfiguration,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last editor.
    pub updated_by: UserId,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted: Option<Deletion>,
}

impl AccountRecord {
    /// Creates a freshly created record.
    #[must_use]
    pub fn created(configuration: AccountConfiguration, by: UserId, at: DateTime<Utc>) -> Self {
        Self {
            configuration,
            created_by: by,
            created_at: at,
            updated_by: by,
            updated_at: at,
            deleted: None,
        }
    }

    /// Returns the account id.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.configuration.account_id
    }

    /// Returns true once soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

impl Lockable for AccountRecord {
    type Key = AccountId;

    fn lock_identity(&self) -> LockIdentity {
        LockIdentity::new(
            self.configuration.scope,
            self.configuration.account_type.as_str(),
        )
    }
}
