//! Balance methodologies: reduce a daily series to one interest base.
//!
//! Each [`SavingsComputationType`] has exactly one strategy. The engine only
//! sees the trait, so a formula can change without touching batch logic.

use chrono::Datelike;
use coopbank_shared::types::{ArithmeticError, DecimalOps};
use rust_decimal::Decimal;

use super::error::SavingsError;
use super::types::SavingsComputationType;
use crate::balance::DailyBalance;

/// The result of applying a methodology to one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodologyOutcome {
    /// Amount interest is computed on.
    pub base_amount: Decimal,
    /// Final ending balance of the period.
    pub ending_balance: Decimal,
}

/// A pluggable reduction of a daily balance series.
pub trait BalanceMethodology: Send + Sync {
    /// The computation type this strategy implements.
    fn kind(&self) -> SavingsComputationType;

    /// The interest base, `None` for an empty series.
    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError>;

    /// Applies the methodology, reporting the period's final balance.
    fn evaluate(
        &self,
        series: &[DailyBalance],
    ) -> Result<Option<MethodologyOutcome>, ArithmeticError> {
        let Some(last) = series.last() else {
            return Ok(None);
        };
        Ok(self
            .base_amount(series)?
            .map(|base_amount| MethodologyOutcome {
                base_amount,
                ending_balance: last.ending_balance,
            }))
    }
}

/// Returns the strategy for `kind`.
#[must_use]
pub fn methodology_for(kind: SavingsComputationType) -> &'static dyn BalanceMethodology {
    match kind {
        SavingsComputationType::DailyLowestBalance => &DailyLowestBalance,
        SavingsComputationType::AverageDailyBalance => &AverageDailyBalance,
        SavingsComputationType::MonthlyEndLowestBalance => &MonthlyEndLowestBalance,
        SavingsComputationType::AdbEndBalance => &AdbEndBalance,
        SavingsComputationType::MonthlyLowestBalanceAverage => &MonthlyLowestBalanceAverage,
        SavingsComputationType::MonthlyEndBalanceAverage => &MonthlyEndBalanceAverage,
        SavingsComputationType::MonthlyEndBalanceTotal => &MonthlyEndBalanceTotal,
    }
}

/// Looks a strategy up by its stored label.
///
/// # Errors
/// Returns `SavingsError::UnknownMethodology` for an unrecognised label.
pub fn methodology_by_label(label: &str) -> Result<&'static dyn BalanceMethodology, SavingsError> {
    SavingsComputationType::parse(label)
        .map(methodology_for)
        .ok_or_else(|| SavingsError::UnknownMethodology(label.to_owned()))
}

/// Splits a date-ordered series into calendar-month runs.
///
/// The last entry of each run is that month's end balance; a trailing
/// partial month closes on the period's last day.
fn months(series: &[DailyBalance]) -> Vec<&[DailyBalance]> {
    series
        .chunk_by(|a, b| a.date.year() == b.date.year() && a.date.month() == b.date.month())
        .collect()
}

fn month_ends(series: &[DailyBalance]) -> Vec<Decimal> {
    months(series)
        .into_iter()
        .filter_map(|month| month.last().map(|day| day.ending_balance))
        .collect()
}

fn month_lows(series: &[DailyBalance]) -> Vec<Decimal> {
    months(series)
        .into_iter()
        .filter_map(|month| month.iter().map(|day| day.ending_balance).min())
        .collect()
}

fn balances(series: &[DailyBalance]) -> Vec<Decimal> {
    series.iter().map(|day| day.ending_balance).collect()
}

/// Minimum of all daily ending balances.
pub struct DailyLowestBalance;

impl BalanceMethodology for DailyLowestBalance {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::DailyLowestBalance
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        Ok(series.iter().map(|day| day.ending_balance).min())
    }
}

/// Arithmetic mean of daily ending balances.
pub struct AverageDailyBalance;

impl BalanceMethodology for AverageDailyBalance {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::AverageDailyBalance
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        DecimalOps::mean(&balances(series))
    }
}

/// Minimum of the month-end balances.
pub struct MonthlyEndLowestBalance;

impl BalanceMethodology for MonthlyEndLowestBalance {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::MonthlyEndLowestBalance
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        Ok(month_ends(series).into_iter().min())
    }
}

/// Average daily balance as the base; the final balance is reported
/// alongside it by [`BalanceMethodology::evaluate`].
pub struct AdbEndBalance;

impl BalanceMethodology for AdbEndBalance {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::AdbEndBalance
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        DecimalOps::mean(&balances(series))
    }
}

/// Mean of each month's lowest balance.
pub struct MonthlyLowestBalanceAverage;

impl BalanceMethodology for MonthlyLowestBalanceAverage {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::MonthlyLowestBalanceAverage
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        DecimalOps::mean(&month_lows(series))
    }
}

/// Mean of the month-end balances.
pub struct MonthlyEndBalanceAverage;

impl BalanceMethodology for MonthlyEndBalanceAverage {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::MonthlyEndBalanceAverage
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        DecimalOps::mean(&month_ends(series))
    }
}

/// Sum of the month-end balances.
pub struct MonthlyEndBalanceTotal;

impl BalanceMethodology for MonthlyEndBalanceTotal {
    fn kind(&self) -> SavingsComputationType {
        SavingsComputationType::MonthlyEndBalanceTotal
    }

    fn base_amount(&self, series: &[DailyBalance]) -> Result<Option<Decimal>, ArithmeticError> {
        let ends = month_ends(series);
        if ends.is_empty() {
            return Ok(None);
        }
        DecimalOps::sum(ends).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    /// Jan 30 to Mar 2: two days of January, all of February, two of March.
    fn series() -> Vec<DailyBalance> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        (0..32)
            .map(|offset| {
                let date = start + Duration::days(offset);
                let ending_balance = match (date.month(), date.day()) {
                    (1, _) => dec!(1000),
                    (2, day) if day < 15 => dec!(400),
                    (2, _) => dec!(900),
                    _ => dec!(600),
                };
                DailyBalance {
                    date,
                    ending_balance,
                }
            })
            .collect()
    }

    #[test]
    fn test_month_grouping() {
        let series = series();
        assert_eq!(months(&series).len(), 3);
        assert_eq!(month_ends(&series), vec![dec!(1000), dec!(900), dec!(600)]);
        assert_eq!(month_lows(&series), vec![dec!(1000), dec!(400), dec!(600)]);
    }

    #[rstest]
    #[case(SavingsComputationType::DailyLowestBalance, dec!(400))]
    #[case(SavingsComputationType::MonthlyEndLowestBalance, dec!(600))]
    #[case(SavingsComputationType::MonthlyLowestBalanceAverage, dec!(2000) / dec!(3))]
    #[case(SavingsComputationType::MonthlyEndBalanceAverage, dec!(2500) / dec!(3))]
    #[case(SavingsComputationType::MonthlyEndBalanceTotal, dec!(2500))]
    fn test_methodologies(#[case] kind: SavingsComputationType, #[case] expected: Decimal) {
        let outcome = methodology_for(kind).evaluate(&series()).unwrap().unwrap();
        assert_eq!(outcome.base_amount, expected);
        assert_eq!(outcome.ending_balance, dec!(600));
    }

    #[test]
    fn test_average_daily_balance() {
        // 2 x 1000 + 14 x 400 + 14 x 900 + 2 x 600 = 21400 over 32 days
        let expected = dec!(21400) / dec!(32);
        for kind in [
            SavingsComputationType::AverageDailyBalance,
            SavingsComputationType::AdbEndBalance,
        ] {
            let outcome = methodology_for(kind).evaluate(&series()).unwrap().unwrap();
            assert_eq!(outcome.base_amount, expected);
        }
    }

    #[test]
    fn test_every_kind_has_a_strategy() {
        for kind in SavingsComputationType::ALL {
            let strategy = methodology_for(*kind);
            assert_eq!(strategy.kind(), *kind);
            assert_eq!(strategy.evaluate(&[]).unwrap(), None);
        }
    }

    #[test]
    fn test_lookup_by_label() {
        let strategy = methodology_by_label("monthly_end_balance_total").unwrap();
        assert_eq!(strategy.kind(), SavingsComputationType::MonthlyEndBalanceTotal);
        assert_eq!(
            methodology_by_label("weekly_average").err(),
            Some(SavingsError::UnknownMethodology("weekly_average".into()))
        );
    }

    #[test]
    fn test_flat_series_agrees_across_averages() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let flat: Vec<DailyBalance> = (0..30)
            .map(|offset| DailyBalance {
                date: start + Duration::days(offset),
                ending_balance: dec!(10000),
            })
            .collect();
        for kind in SavingsComputationType::ALL {
            let outcome = methodology_for(*kind).evaluate(&flat).unwrap().unwrap();
            assert_eq!(outcome.base_amount, dec!(10000));
        }
    }
}
