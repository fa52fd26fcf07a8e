//! Pure batch computation over prefetched inputs.
//!
//! The engine never touches storage. The service gathers one [`PairInput`]
//! per eligible pair and hands the whole set over; pairs are independent
//! and are computed on the rayon pool.

use chrono::NaiveDate;
use coopbank_shared::config::InterestConfig;
use coopbank_shared::types::{DecimalOps, SavingsInterestBatchId, SavingsInterestEntryId};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::error::SavingsError;
use super::methodology::methodology_for;
use super::types::{CreateBatchParams, EligiblePair, SavingsInterestEntry};
use crate::account::AccountConfiguration;
use crate::balance::DailyBalance;
use crate::ledger::LedgerKey;

/// Everything needed to compute one pair.
#[derive(Debug, Clone)]
pub struct PairInput {
    /// The pair.
    pub pair: EligiblePair,
    /// Account configuration in effect at the period end.
    pub config: AccountConfiguration,
    /// Day the member took their current member type, when the rate needs it.
    pub member_since: Option<NaiveDate>,
    /// Daily ending balances over `[last, new)`.
    pub series: Vec<DailyBalance>,
}

/// Result of a batch computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchComputation {
    /// Entries in `(account, member)` order.
    pub entries: Vec<SavingsInterestEntry>,
    /// Sum of entry interest.
    pub total_interest: Decimal,
    /// Sum of entry tax.
    pub total_tax: Decimal,
    /// Pairs that produced no entry.
    pub skipped: Vec<LedgerKey>,
}

impl BatchComputation {
    /// Adds pairs that were set aside before computation to `skipped`.
    #[must_use]
    pub(crate) fn with_skipped(mut self, keys: Vec<LedgerKey>) -> Self {
        self.skipped.extend(keys);
        self.skipped.sort();
        self
    }
}

/// Computes savings interest entries.
pub struct SavingsInterestBatchEngine;

impl SavingsInterestBatchEngine {
    /// Computes every pair of a batch.
    ///
    /// # Arguments
    /// * `batch_id` - Owner of the produced entries
    /// * `params` - Period, methodology and tax rate
    /// * `inputs` - One input per pair, in any order
    /// * `interest` - Day count and rounding scale
    ///
    /// # Returns
    /// Entries sorted by key, so two runs over the same inputs produce the
    /// same batch regardless of input order or scheduling.
    ///
    /// # Errors
    /// Returns `SavingsError::Arithmetic` on decimal overflow.
    pub fn compute(
        batch_id: SavingsInterestBatchId,
        params: &CreateBatchParams,
        inputs: &[PairInput],
        interest: &InterestConfig,
    ) -> Result<BatchComputation, SavingsError> {
        let outcomes: Vec<(LedgerKey, Option<SavingsInterestEntry>)> = inputs
            .par_iter()
            .map(|input| {
                Self::compute_pair(batch_id, params, input, interest)
                    .map(|entry| (input.pair.key, entry))
            })
            .collect::<Result<_, _>>()?;

        let mut entries = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (key, entry) in outcomes {
            match entry {
                Some(entry) => entries.push(entry),
                None => skipped.push(key),
            }
        }
        entries.sort_by_key(|entry| entry.key);
        skipped.sort();

        let total_interest = DecimalOps::sum(entries.iter().map(|e| e.interest_amount))?;
        let total_tax = DecimalOps::sum(entries.iter().map(|e| e.interest_tax))?;

        Ok(BatchComputation {
            entries,
            total_interest,
            total_tax,
            skipped,
        })
    }

    /// Computes one pair, `None` when it earns nothing.
    ///
    /// 1. An empty or zero-ending series is skipped.
    /// 2. Below the minimum balance the pair is charged `below_minimum_charge`
    ///    as negative interest, or skipped if there is no charge.
    /// 3. Otherwise the methodology's base accrues at the tiered rate over
    ///    `[last_computation_date, new_computation_date)` under the
    ///    configured day count.
    pub fn compute_pair(
        batch_id: SavingsInterestBatchId,
        params: &CreateBatchParams,
        input: &PairInput,
        interest: &InterestConfig,
    ) -> Result<Option<SavingsInterestEntry>, SavingsError> {
        let Some(last) = input.series.last() else {
            debug!(key = %input.pair.key, "no balances in period");
            return Ok(None);
        };
        let ending = last.ending_balance;
        if ending.is_zero() {
            return Ok(None);
        }

        let savings = &input.config.savings;
        let scale = interest.money_scale;

        if ending < savings.minimum_balance {
            let charge = DecimalOps::round_money(savings.below_minimum_charge, scale);
            if charge.is_zero() {
                return Ok(None);
            }
            return Ok(Some(Self::entry(
                batch_id,
                &input.pair,
                EntryAmounts {
                    ending_balance: DecimalOps::sub(ending, charge)?,
                    base_amount: ending,
                    applied_rate: Decimal::ZERO,
                    interest_amount: -charge,
                    interest_tax: Decimal::ZERO,
                },
            )));
        }

        let methodology = methodology_for(params.computation_type);
        let Some(outcome) = methodology.evaluate(&input.series)? else {
            return Ok(None);
        };
        if outcome.base_amount <= Decimal::ZERO {
            return Ok(None);
        }

        let rate = savings.rate_for(ending, input.member_since, input.config.interest.standard);
        let days = interest
            .day_count
            .days_between(params.last_computation_date, params.new_computation_date);
        let raw = DecimalOps::annualized_interest(
            outcome.base_amount,
            rate,
            days,
            interest.day_count.annual_divisor(),
        )?;
        let interest_amount = DecimalOps::round_money(raw, scale);
        if interest_amount.is_zero() {
            return Ok(None);
        }

        let interest_tax = if savings.is_taxable {
            DecimalOps::round_money(
                DecimalOps::mul(interest_amount, params.interest_tax_rate)?,
                scale,
            )
        } else {
            Decimal::ZERO
        };

        Ok(Some(Self::entry(
            batch_id,
            &input.pair,
            EntryAmounts {
                ending_balance: outcome.ending_balance,
                base_amount: outcome.base_amount,
                applied_rate: rate,
                interest_amount,
                interest_tax,
            },
        )))
    }

    fn entry(
        batch_id: SavingsInterestBatchId,
        pair: &EligiblePair,
        amounts: EntryAmounts,
    ) -> SavingsInterestEntry {
        SavingsInterestEntry {
            id: SavingsInterestEntryId::new(),
            batch_id,
            key: pair.key,
            member_type_id: pair.member_type_id,
            ledger_id: pair.ledger_id,
            ending_balance: amounts.ending_balance,
            base_amount: amounts.base_amount,
            applied_rate: amounts.applied_rate,
            interest_amount: amounts.interest_amount,
            interest_tax: amounts.interest_tax,
            posted_at: None,
        }
    }
}

struct EntryAmounts {
    ending_balance: Decimal,
    base_amount: Decimal,
    applied_rate: Decimal,
    interest_amount: Decimal,
    interest_tax: Decimal,
}
