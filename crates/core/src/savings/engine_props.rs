//! Property-based tests for batch computation.

use chrono::{Duration, NaiveDate};
use coopbank_shared::config::InterestConfig;
use coopbank_shared::types::{
    AccountId, BranchId, CurrencyId, MemberProfileId, OrganizationId, SavingsInterestBatchId,
    Scope,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::engine::{BatchComputation, PairInput, SavingsInterestBatchEngine};
use super::types::{
    BatchFilter, CreateBatchParams, EligiblePair, SavingsComputationType,
};
use crate::account::{AccountConfiguration, AccountType};
use crate::balance::DailyBalance;
use crate::ledger::LedgerKey;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn params(computation_type: SavingsComputationType, days: i64) -> CreateBatchParams {
    CreateBatchParams {
        document_no: "SI-PROP".into(),
        last_computation_date: start(),
        new_computation_date: start() + Duration::days(days),
        computation_type,
        filter: BatchFilter::default(),
        include_existing_computed_interest: false,
        interest_tax_rate: dec!(0.20),
    }
}

fn computation_type_strategy() -> impl Strategy<Value = SavingsComputationType> {
    prop::sample::select(SavingsComputationType::ALL.to_vec())
}

/// Balances in cents, up to 1,000,000.00.
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn pair_strategy(days: i64) -> impl Strategy<Value = PairInput> {
    (
        prop::collection::vec(balance_strategy(), days as usize),
        0u32..=12,
        balance_strategy(),
        any::<bool>(),
    )
        .prop_map(|(balances, rate, minimum, taxable)| {
            let scope = Scope::new(OrganizationId::new(), BranchId::new());
            let mut config = AccountConfiguration::new(
                AccountId::new(),
                scope,
                "Savings",
                AccountType::Deposit,
                CurrencyId::new(),
            );
            config.interest.standard = Decimal::from(rate);
            config.savings.minimum_balance = minimum / dec!(100);
            config.savings.below_minimum_charge = dec!(15);
            config.savings.is_taxable = taxable;

            let series = balances
                .into_iter()
                .enumerate()
                .map(|(offset, ending_balance)| DailyBalance {
                    date: start() + Duration::days(offset as i64),
                    ending_balance,
                })
                .collect();
            PairInput {
                pair: EligiblePair {
                    key: LedgerKey::new(scope, config.account_id, MemberProfileId::new()),
                    member_type_id: None,
                    ledger_id: None,
                    closed: false,
                },
                config,
                member_since: None,
                series,
            }
        })
}

fn batch_strategy() -> impl Strategy<Value = (i64, Vec<PairInput>)> {
    (1i64..62).prop_flat_map(|days| (Just(days), prop::collection::vec(pair_strategy(days), 0..12)))
}

/// Entry amounts keyed by pair, ignoring generated ids.
fn amounts(computation: &BatchComputation) -> Vec<(LedgerKey, Decimal, Decimal, Decimal)> {
    computation
        .entries
        .iter()
        .map(|e| (e.key, e.base_amount, e.interest_amount, e.interest_tax))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Two runs over the same inputs produce the same entries and totals.
    #[test]
    fn prop_deterministic((days, inputs) in batch_strategy(), kind in computation_type_strategy()) {
        let params = params(kind, days);
        let config = InterestConfig::default();
        let first = SavingsInterestBatchEngine::compute(SavingsInterestBatchId::new(), &params, &inputs, &config).unwrap();
        let second = SavingsInterestBatchEngine::compute(SavingsInterestBatchId::new(), &params, &inputs, &config).unwrap();
        prop_assert_eq!(amounts(&first), amounts(&second));
        prop_assert_eq!(first.total_interest, second.total_interest);
        prop_assert_eq!(first.total_tax, second.total_tax);
    }

    /// Input order does not change the result.
    #[test]
    fn prop_order_independent((days, inputs) in batch_strategy(), kind in computation_type_strategy()) {
        let params = params(kind, days);
        let config = InterestConfig::default();
        let mut reversed = inputs.clone();
        reversed.reverse();
        let forward = SavingsInterestBatchEngine::compute(SavingsInterestBatchId::new(), &params, &inputs, &config).unwrap();
        let backward = SavingsInterestBatchEngine::compute(SavingsInterestBatchId::new(), &params, &reversed, &config).unwrap();
        prop_assert_eq!(amounts(&forward), amounts(&backward));
        prop_assert_eq!(forward.skipped, backward.skipped);
    }

    /// Totals are the exact sum of the entries, and every pair is accounted for.
    #[test]
    fn prop_totals_match_entries((days, inputs) in batch_strategy(), kind in computation_type_strategy()) {
        let params = params(kind, days);
        let batch_id = SavingsInterestBatchId::new();
        let result = SavingsInterestBatchEngine::compute(batch_id, &params, &inputs, &InterestConfig::default()).unwrap();

        let interest: Decimal = result.entries.iter().map(|e| e.interest_amount).sum();
        let tax: Decimal = result.entries.iter().map(|e| e.interest_tax).sum();
        prop_assert_eq!(result.total_interest, interest);
        prop_assert_eq!(result.total_tax, tax);
        prop_assert_eq!(result.entries.len() + result.skipped.len(), inputs.len());

        for pair in result.entries.windows(2) {
            prop_assert!(pair[0].key < pair[1].key);
        }
        for entry in &result.entries {
            prop_assert_eq!(entry.batch_id, batch_id);
            prop_assert!(entry.interest_tax >= Decimal::ZERO);
            prop_assert!(entry.interest_tax <= entry.interest_amount.abs());
            prop_assert_eq!(entry.interest_amount.round_dp(2), entry.interest_amount);
        }
    }
}
