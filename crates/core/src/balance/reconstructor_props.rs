//! Property-based tests for daily balance reconstruction.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::balance::reconstructor::DailyBalanceReconstructor;
use crate::balance::types::LedgerDelta;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Signed amounts in cents, up to +/- 1,000,000.00.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A period length and deltas dated inside it.
fn period_strategy() -> impl Strategy<Value = (i64, Vec<LedgerDelta>)> {
    (1i64..120).prop_flat_map(|days| {
        let delta = (0..days, amount_strategy(), 0i64..86_400).prop_map(|(offset, amount, secs)| {
            let entry_date = start() + Duration::days(offset);
            LedgerDelta {
                entry_date,
                amount,
                recorded_at: Utc.from_utc_datetime(&entry_date.and_hms_opt(0, 0, 0).unwrap())
                    + Duration::seconds(secs),
            }
        });
        (Just(days), prop::collection::vec(delta, 0..40))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Exactly one entry per calendar day, in date order.
    #[test]
    fn prop_one_entry_per_day((days, deltas) in period_strategy(), opening in amount_strategy()) {
        let to = start() + Duration::days(days);
        let series = DailyBalanceReconstructor::from_deltas(opening, deltas, start(), to).unwrap();
        prop_assert_eq!(series.len() as i64, days);
        for (offset, day) in series.iter().enumerate() {
            prop_assert_eq!(day.date, start() + Duration::days(offset as i64));
        }
    }

    /// Reconstruction is independent of the order deltas arrive in.
    #[test]
    fn prop_input_order_is_irrelevant((days, deltas) in period_strategy(), opening in amount_strategy()) {
        let to = start() + Duration::days(days);
        let mut reversed = deltas.clone();
        reversed.reverse();
        let forward = DailyBalanceReconstructor::from_deltas(opening, deltas, start(), to).unwrap();
        let backward = DailyBalanceReconstructor::from_deltas(opening, reversed, start(), to).unwrap();
        prop_assert_eq!(forward, backward);
    }

    /// The final balance is the opening balance plus every delta.
    #[test]
    fn prop_final_balance_is_total((days, deltas) in period_strategy(), opening in amount_strategy()) {
        let to = start() + Duration::days(days);
        let expected = deltas.iter().fold(opening, |acc, delta| acc + delta.amount);
        let series = DailyBalanceReconstructor::from_deltas(opening, deltas, start(), to).unwrap();
        prop_assert_eq!(series.last().unwrap().ending_balance, expected);
    }

    /// Splitting the range and chaining the halves gives the same series.
    #[test]
    fn prop_restartable((days, deltas) in period_strategy(), opening in amount_strategy(), cut in 0i64..120) {
        let to = start() + Duration::days(days);
        let mid = start() + Duration::days(cut.min(days));
        let whole = DailyBalanceReconstructor::from_deltas(opening, deltas.clone(), start(), to).unwrap();

        let (first, second): (Vec<_>, Vec<_>) =
            deltas.into_iter().partition(|delta| delta.entry_date < mid);
        let mut chained = DailyBalanceReconstructor::from_deltas(opening, first, start(), mid).unwrap();
        let resume = chained.last().map_or(opening, |day| day.ending_balance);
        chained.extend(DailyBalanceReconstructor::from_deltas(resume, second, mid, to).unwrap());
        prop_assert_eq!(whole, chained);
    }
}
