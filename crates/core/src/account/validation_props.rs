//! Property-based tests for account configuration validation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use coopbank_shared::types::{AccountId, BranchId, CurrencyId, OrganizationId, Scope};

use crate::account::error::AccountError;
use crate::account::schedule::{FineContext, FineFrequency};
use crate::account::types::{AccountConfiguration, AccountType};
use crate::account::validation::validate;

fn base_config() -> AccountConfiguration {
    AccountConfiguration::new(
        AccountId::new(),
        Scope::new(OrganizationId::new(), BranchId::new()),
        "Share Capital",
        AccountType::Deposit,
        CurrencyId::new(),
    )
}

/// Percentages in [0, 100] with two decimal places.
fn in_range_pct() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Percentages strictly above 100.
fn above_range_pct() -> impl Strategy<Value = Decimal> {
    (10_001i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_frequency() -> impl Strategy<Value = FineFrequency> {
    prop::sample::select(FineFrequency::ALL.to_vec())
}

fn arb_context() -> impl Strategy<Value = FineContext> {
    prop::sample::select(FineContext::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every in-range value is accepted in every percentage slot.
    #[test]
    fn prop_in_range_percentages_pass(
        standard in in_range_pct(),
        fine in in_range_pct(),
        cell in in_range_pct(),
        frequency in arb_frequency(),
        context in arb_context(),
    ) {
        let mut config = base_config();
        config.interest.standard = standard;
        config.fines.amortization = fine;
        config.fine_schedule.set(frequency, context, cell);
        prop_assert!(validate(&config).is_ok());
    }

    /// Any out-of-range matrix cell is rejected.
    #[test]
    fn prop_out_of_range_cell_rejected(
        cell in above_range_pct(),
        frequency in arb_frequency(),
        context in arb_context(),
    ) {
        let mut config = base_config();
        config.fine_schedule.set(frequency, context, cell);
        let rejected = matches!(
            validate(&config),
            Err(AccountError::PercentageOutOfRange { .. })
        );
        prop_assert!(rejected);
    }

    /// Negative percentages are rejected.
    #[test]
    fn prop_negative_rate_rejected(n in 1i64..1_000_000i64) {
        let mut config = base_config();
        config.interest.secured = Decimal::new(-n, 2);
        prop_assert!(validate(&config).is_err());
    }

    /// Grace days are accepted exactly up to 365.
    #[test]
    fn prop_grace_boundary(days in 0u32..1000u32) {
        let mut config = base_config();
        config.grace.maturity_days = days;
        prop_assert_eq!(validate(&config).is_ok(), days <= 365);
    }
}
