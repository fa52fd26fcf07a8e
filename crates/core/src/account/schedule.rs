//! Fine schedule matrix and ledger-source visibility flags.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

labeled_enum! {
    /// Fine accrual frequency, ordered by period length.
    pub enum FineFrequency {
        /// Every day.
        Daily => "daily",
        /// Every seven days.
        Weekly => "weekly",
        /// Twice a month.
        SemiMonthly => "semi_monthly",
        /// Every month.
        Monthly => "monthly",
        /// Every quarter.
        Quarterly => "quarterly",
        /// Twice a year.
        SemiAnnual => "semi_annual",
        /// Every year.
        Annual => "annual",
        /// One-time terminal settlement.
        Lumpsum => "lumpsum",
    }
}

impl FineFrequency {
    /// Frequencies selectable by elapsed time, finest first.
    pub const PERIODIC: [Self; 7] = [
        Self::Daily,
        Self::Weekly,
        Self::SemiMonthly,
        Self::Monthly,
        Self::Quarterly,
        Self::SemiAnnual,
        Self::Annual,
    ];

    /// Period length in days. `None` for lumpsum.
    #[must_use]
    pub const fn period_days(self) -> Option<i64> {
        match self {
            Self::Daily => Some(1),
            Self::Weekly => Some(7),
            Self::SemiMonthly => Some(15),
            Self::Monthly => Some(30),
            Self::Quarterly => Some(90),
            Self::SemiAnnual => Some(182),
            Self::Annual => Some(365),
            Self::Lumpsum => None,
        }
    }
}

labeled_enum! {
    /// What a fine is levied for.
    pub enum FineContext {
        /// Late periodic installment.
        Amortization => "amortization",
        /// Failure to settle by maturity.
        Maturity => "maturity",
    }
}

labeled_enum! {
    /// Cash channel for grace-period entry fines.
    pub enum CashFineChannel {
        /// Cash on hand.
        CashOnHand => "cash_on_hand",
        /// Cash in bank.
        CashInBank => "cash_in_bank",
    }
}

labeled_enum! {
    /// Transaction source an account may be posted from.
    pub enum LedgerSource {
        /// Withdrawal slips.
        Withdraw => "withdraw",
        /// Deposit slips.
        Deposit => "deposit",
        /// General journal.
        Journal => "journal",
        /// Payments.
        Payment => "payment",
        /// Adjustment entries.
        Adjustment => "adjustment",
        /// Journal vouchers.
        JournalVoucher => "journal_voucher",
        /// Check vouchers.
        CheckVoucher => "check_voucher",
    }
}

/// Percentages for both fine contexts at one frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRates {
    /// Amortization percentage, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization: Option<Decimal>,
    /// Maturity percentage, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity: Option<Decimal>,
}

impl ContextRates {
    /// Returns the rate for one context.
    #[must_use]
    pub const fn get(&self, context: FineContext) -> Option<Decimal> {
        match context {
            FineContext::Amortization => self.amortization,
            FineContext::Maturity => self.maturity,
        }
    }

    fn set(&mut self, context: FineContext, percentage: Decimal) {
        match context {
            FineContext::Amortization => self.amortization = Some(percentage),
            FineContext::Maturity => self.maturity = Some(percentage),
        }
    }
}

/// Percentage per (frequency × context), plus the cash-channel entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineSchedule {
    #[serde(default)]
    rates: BTreeMap<FineFrequency, ContextRates>,
    #[serde(default)]
    cash: BTreeMap<CashFineChannel, Decimal>,
}

impl FineSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FineSchedule::set`].
    #[must_use]
    pub fn with_rate(
        mut self,
        frequency: FineFrequency,
        context: FineContext,
        percentage: Decimal,
    ) -> Self {
        self.set(frequency, context, percentage);
        self
    }

    /// Sets one matrix cell.
    pub fn set(&mut self, frequency: FineFrequency, context: FineContext, percentage: Decimal) {
        self.rates
            .entry(frequency)
            .or_default()
            .set(context, percentage);
    }

    /// Returns one matrix cell, if configured.
    #[must_use]
    pub fn rate(&self, frequency: FineFrequency, context: FineContext) -> Option<Decimal> {
        self.rates
            .get(&frequency)
            .and_then(|rates| rates.get(context))
    }

    /// Sets a cash-channel entry.
    pub fn set_cash(&mut self, channel: CashFineChannel, percentage: Decimal) {
        self.cash.insert(channel, percentage);
    }

    /// Returns a cash-channel entry, if configured.
    #[must_use]
    pub fn cash_rate(&self, channel: CashFineChannel) -> Option<Decimal> {
        self.cash.get(&channel).copied()
    }

    /// Iterates over every configured matrix cell.
    pub fn cells(&self) -> impl Iterator<Item = (FineFrequency, FineContext, Decimal)> + '_ {
        self.rates.iter().flat_map(|(frequency, rates)| {
            FineContext::ALL
                .iter()
                .filter_map(move |context| rates.get(*context).map(|pct| (*frequency, *context, pct)))
        })
    }

    /// Iterates over every configured cash-channel entry.
    pub fn cash_entries(&self) -> impl Iterator<Item = (CashFineChannel, Decimal)> + '_ {
        self.cash.iter().map(|(channel, pct)| (*channel, *pct))
    }
}

/// The set of ledger sources an account is shown for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerSourceVisibility(BTreeSet<LedgerSource>);

impl LedgerSourceVisibility {
    /// Visible for no source.
    #[must_use]
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true if the account is shown when posting from `source`.
    #[must_use]
    pub fn shows(&self, source: LedgerSource) -> bool {
        self.0.contains(&source)
    }

    /// Shows the account for `source`.
    pub fn show(&mut self, source: LedgerSource) {
        self.0.insert(source);
    }

    /// Hides the account for `source`.
    pub fn hide(&mut self, source: LedgerSource) {
        self.0.remove(&source);
    }

    /// Iterates over visible sources in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = LedgerSource> + '_ {
        self.0.iter().copied()
    }
}

impl Default for LedgerSourceVisibility {
    /// Shown for every source.
    fn default() -> Self {
        Self(LedgerSource::ALL.iter().copied().collect())
    }
}

impl FromIterator<LedgerSource> for LedgerSourceVisibility {
    fn from_iter<I: IntoIterator<Item = LedgerSource>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
