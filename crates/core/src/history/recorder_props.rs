//! Property-based tests for history recording.
//!
//! Replays random create/update/delete sequences with random (and sometimes
//! backwards) clocks, then checks the resulting timeline.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use coopbank_shared::types::{AccountId, BranchId, CurrencyId, OrganizationId, Scope, UserId};

use crate::account::{AccountConfiguration, AccountType};
use crate::history::recorder::TemporalHistoryRecorder;
use crate::history::timeline::{check_gapless, resolve_as_of};
use crate::history::types::{AccountHistory, HistoryWrite};

#[derive(Debug, Clone)]
enum Step {
    /// Update the standard rate, the clock moving by the given seconds.
    Update { rate_bp: i64, clock_secs: i64 },
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        (0i64..=10_000i64, -60i64..=86_400i64)
            .prop_map(|(rate_bp, clock_secs)| Step::Update { rate_bp, clock_secs }),
        0..20,
    )
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn apply(rows: &mut Vec<AccountHistory>, write: HistoryWrite) {
    if let Some(close) = write.close {
        let row = rows
            .iter_mut()
            .find(|row| row.id == close.history_id)
            .unwrap();
        row.valid_to = Some(close.valid_to);
    }
    rows.push(write.append);
}

fn replay(steps: &[Step], delete: bool) -> (AccountConfiguration, Vec<AccountHistory>) {
    let config = AccountConfiguration::new(
        AccountId::new(),
        Scope::new(OrganizationId::new(), BranchId::new()),
        "Savings",
        AccountType::Deposit,
        CurrencyId::new(),
    );
    let mut rows = Vec::new();
    let mut clock = epoch();
    apply(
        &mut rows,
        TemporalHistoryRecorder::record_create(None, &config, UserId::new(), clock).unwrap(),
    );

    let mut current = config.clone();
    for step in steps {
        let Step::Update { rate_bp, clock_secs } = step;
        clock += Duration::seconds(*clock_secs);
        let mut next = current.clone();
        next.interest.standard = Decimal::new(*rate_bp, 2);
        let open = rows.iter().find(|row| row.is_open()).cloned();
        apply(
            &mut rows,
            TemporalHistoryRecorder::record_update(open.as_ref(), &current, &next, UserId::new(), clock)
                .unwrap(),
        );
        current = next;
    }

    if delete {
        clock += Duration::seconds(1);
        let open = rows.iter().find(|row| row.is_open()).cloned();
        apply(
            &mut rows,
            TemporalHistoryRecorder::record_delete(open.as_ref(), &current, UserId::new(), clock)
                .unwrap(),
        );
    }
    (current, rows)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any mutation sequence yields a gapless timeline with n + 1 rows.
    #[test]
    fn prop_timeline_is_gapless(steps in arb_steps(), delete in any::<bool>()) {
        let (_, rows) = replay(&steps, delete);
        prop_assert!(check_gapless(&rows).is_ok());
        prop_assert_eq!(rows.len(), steps.len() + 1 + usize::from(delete));
        let open = rows.iter().filter(|row| row.is_open()).count();
        prop_assert_eq!(open, usize::from(!delete));
    }

    /// Resolving far in the future returns the last written configuration.
    #[test]
    fn prop_latest_snapshot_wins(steps in arb_steps(), delete in any::<bool>()) {
        let (current, rows) = replay(&steps, delete);
        let far = epoch() + Duration::days(3650);
        let resolved = resolve_as_of(&rows, far).unwrap();
        prop_assert_eq!(&resolved.snapshot, &current);
    }

    /// Every instant from creation on resolves to exactly one snapshot.
    #[test]
    fn prop_every_instant_resolves(steps in arb_steps(), offset in 0i64..2_000_000i64) {
        let (_, rows) = replay(&steps, false);
        let at = epoch() + Duration::seconds(offset);
        let containing = rows.iter().filter(|row| row.contains(at)).count();
        prop_assert_eq!(containing, 1);
        prop_assert!(resolve_as_of(&rows, epoch() - Duration::seconds(1)).is_none());
    }
}
