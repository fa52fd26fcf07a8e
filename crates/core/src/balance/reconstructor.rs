//! Day-by-day balance reconstruction.

use chrono::NaiveDate;
use coopbank_shared::types::DecimalOps;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use super::error::BalanceError;
use super::source::LedgerDeltaSource;
use super::types::{DailyBalance, LedgerDelta};
use crate::ledger::LedgerKey;

/// Rebuilds one ending balance per calendar day.
///
/// Reconstruction is a pure function of the opening balance and the deltas
/// in range, so repeated calls over unchanged data return identical series.
pub struct DailyBalanceReconstructor;

impl DailyBalanceReconstructor {
    /// Fetches deltas for `key` and reconstructs `[from, to)`.
    ///
    /// # Returns
    ///
    /// Exactly one entry per day in `[from, to)`, ordered by date. Empty when
    /// `from == to`.
    ///
    /// # Errors
    ///
    /// * `BalanceError::InvalidRange` if `to < from`
    /// * `BalanceError::Dependency` if the source fails; no partial series is returned
    #[instrument(skip(source), fields(pair = %key), level = "debug")]
    pub async fn reconstruct(
        source: &dyn LedgerDeltaSource,
        key: &LedgerKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyBalance>, BalanceError> {
        if to < from {
            return Err(BalanceError::InvalidRange { from, to });
        }
        if to == from {
            return Ok(Vec::new());
        }

        let dependency = |err: crate::store::StoreError| {
            warn!(error = %err, "ledger source failed");
            BalanceError::Dependency {
                key: *key,
                date: from,
                message: err.to_string(),
            }
        };
        let opening = source.opening_balance(key, from).await.map_err(dependency)?;
        let deltas = source
            .fetch_deltas(key, from, to)
            .await
            .map_err(dependency)?;

        let series = Self::from_deltas(opening, deltas, from, to)?;
        debug!(days = series.len(), "reconstructed balance series");
        Ok(series)
    }

    /// Reconstructs `[from, to)` from an opening balance and raw deltas.
    ///
    /// Deltas are applied in `(entry_date, recorded_at)` order; every delta
    /// dated on a day is applied before that day's balance is recorded.
    ///
    /// # Errors
    ///
    /// * `BalanceError::InvalidRange` if `to < from`
    /// * `BalanceError::DeltaOutOfRange` if a delta falls outside `[from, to)`
    pub fn from_deltas(
        opening: Decimal,
        mut deltas: Vec<LedgerDelta>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyBalance>, BalanceError> {
        if to < from {
            return Err(BalanceError::InvalidRange { from, to });
        }
        if let Some(stray) = deltas
            .iter()
            .find(|delta| delta.entry_date < from || delta.entry_date >= to)
        {
            return Err(BalanceError::DeltaOutOfRange {
                date: stray.entry_date,
                from,
                to,
            });
        }
        deltas.sort_by_key(|delta| (delta.entry_date, delta.recorded_at));

        let mut series = Vec::new();
        let mut balance = opening;
        let mut pending = deltas.iter().peekable();
        for date in from.iter_days().take_while(|date| *date < to) {
            while let Some(delta) = pending.next_if(|delta| delta.entry_date == date) {
                balance = DecimalOps::add(balance, delta.amount)?;
            }
            series.push(DailyBalance {
                date,
                ending_balance: balance,
            });
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::source::MockLedgerDeltaSource;
    use crate::store::StoreError;
    use chrono::{Duration, TimeZone, Utc};
    use coopbank_shared::types::{
        AccountId, BranchId, MemberProfileId, OrganizationId, Scope,
    };
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn delta(day: u32, amount: Decimal, seq: i64) -> LedgerDelta {
        LedgerDelta {
            entry_date: date(day),
            amount,
            recorded_at: Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()
                + Duration::seconds(seq),
        }
    }

    fn key() -> LedgerKey {
        LedgerKey::new(
            Scope::new(OrganizationId::new(), BranchId::new()),
            AccountId::new(),
            MemberProfileId::new(),
        )
    }

    #[test]
    fn test_carries_balance_forward() {
        let series = DailyBalanceReconstructor::from_deltas(
            dec!(100),
            vec![delta(3, dec!(50), 0), delta(5, dec!(-20), 0)],
            date(1),
            date(7),
        )
        .unwrap();

        let balances: Vec<Decimal> = series.iter().map(|day| day.ending_balance).collect();
        assert_eq!(
            balances,
            vec![dec!(100), dec!(100), dec!(150), dec!(150), dec!(130), dec!(130)]
        );
        assert_eq!(series.first().unwrap().date, date(1));
        assert_eq!(series.last().unwrap().date, date(6));
    }

    #[test]
    fn test_same_day_deltas_applied_before_recording() {
        let series = DailyBalanceReconstructor::from_deltas(
            Decimal::ZERO,
            vec![delta(2, dec!(-30), 2), delta(2, dec!(100), 1)],
            date(1),
            date(3),
        )
        .unwrap();
        assert_eq!(series[0].ending_balance, Decimal::ZERO);
        assert_eq!(series[1].ending_balance, dec!(70));
    }

    #[test]
    fn test_empty_and_inverted_ranges() {
        assert!(
            DailyBalanceReconstructor::from_deltas(dec!(5), vec![], date(4), date(4))
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            DailyBalanceReconstructor::from_deltas(dec!(5), vec![], date(4), date(3)),
            Err(BalanceError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_stray_delta_is_rejected() {
        let result = DailyBalanceReconstructor::from_deltas(
            Decimal::ZERO,
            vec![delta(9, dec!(1), 0)],
            date(1),
            date(5),
        );
        assert!(matches!(result, Err(BalanceError::DeltaOutOfRange { .. })));
    }

    #[test]
    fn test_crosses_month_boundary() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        let series =
            DailyBalanceReconstructor::from_deltas(dec!(1), vec![], from, to).unwrap();
        let dates: Vec<NaiveDate> = series.iter().map(|day| day.date).collect();
        assert_eq!(
            dates,
            vec![
                from,
                NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_reconstruct_uses_source() {
        let mut source = MockLedgerDeltaSource::new();
        source
            .expect_opening_balance()
            .returning(|_, _| Ok(dec!(10000)));
        source
            .expect_fetch_deltas()
            .returning(|_, _, _| Ok(vec![delta(2, dec!(500), 0)]));

        let series = DailyBalanceReconstructor::reconstruct(&source, &key(), date(1), date(4))
            .await
            .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[2].ending_balance, dec!(10500));
    }

    #[tokio::test]
    async fn test_source_failure_is_dependency_error() {
        let mut source = MockLedgerDeltaSource::new();
        source
            .expect_opening_balance()
            .returning(|_, _| Ok(Decimal::ZERO));
        source
            .expect_fetch_deltas()
            .returning(|_, _, _| Err(StoreError::Unavailable("ledger offline".into())));

        let pair = key();
        let err = DailyBalanceReconstructor::reconstruct(&source, &pair, date(1), date(4))
            .await
            .unwrap_err();
        match err {
            BalanceError::Dependency { key, date: at, .. } => {
                assert_eq!(key, pair);
                assert_eq!(at, date(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_range_skips_source() {
        let mut source = MockLedgerDeltaSource::new();
        source.expect_opening_balance().never();
        source.expect_fetch_deltas().never();
        let series = DailyBalanceReconstructor::reconstruct(&source, &key(), date(4), date(4))
            .await
            .unwrap();
        assert!(series.is_empty());
    }
}
