//! Pure queries over an account's history rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use coopbank_shared::types::AccountId;

use super::types::AccountHistory;

/// A timeline invariant that does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineViolation {
    /// A row other than the last one is still open.
    OpenBeforeEnd {
        /// Offending row position in `valid_from` order.
        index: usize,
    },
    /// A row's `valid_to` differs from its successor's `valid_from`.
    Gap {
        /// Position of the earlier row.
        index: usize,
    },
    /// A row ends before it starts.
    Inverted {
        /// Offending row position.
        index: usize,
    },
    /// More than one row is open.
    MultipleOpen,
}

/// Sorts rows by `valid_from`, stable on ties.
#[must_use]
pub fn ordered(rows: &[AccountHistory]) -> Vec<&AccountHistory> {
    let mut sorted: Vec<&AccountHistory> = rows.iter().collect();
    sorted.sort_by_key(|row| row.valid_from);
    sorted
}

/// Resolves the snapshot in force at `at`.
///
/// Returns the row whose `[valid_from, valid_to)` contains `at`. When no row
/// contains it (the account was deleted earlier), falls back to the latest row
/// with `valid_from <= at`, taking the last-appended row on ties. `None` means
/// `at` predates the account.
#[must_use]
pub fn resolve_as_of(rows: &[AccountHistory], at: DateTime<Utc>) -> Option<&AccountHistory> {
    let sorted = ordered(rows);
    if let Some(row) = sorted.iter().rev().find(|row| row.contains(at)) {
        return Some(row);
    }
    sorted.into_iter().rev().find(|row| row.valid_from <= at)
}

/// Checks that rows form a gapless, non-overlapping timeline.
///
/// # Errors
///
/// Returns the first [`TimelineViolation`] found.
pub fn check_gapless(rows: &[AccountHistory]) -> Result<(), TimelineViolation> {
    let sorted = ordered(rows);
    if sorted.iter().filter(|row| row.is_open()).count() > 1 {
        return Err(TimelineViolation::MultipleOpen);
    }
    for (index, row) in sorted.iter().enumerate() {
        if row.valid_to.is_some_and(|end| end < row.valid_from) {
            return Err(TimelineViolation::Inverted { index });
        }
        let Some(next) = sorted.get(index + 1) else {
            break;
        };
        match row.valid_to {
            None => return Err(TimelineViolation::OpenBeforeEnd { index }),
            Some(end) if end != next.valid_from => return Err(TimelineViolation::Gap { index }),
            Some(_) => {}
        }
    }
    Ok(())
}

/// Rows whose `valid_from` falls in `[start, end)`.
#[must_use]
pub fn changed_in_range(
    rows: &[AccountHistory],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&AccountHistory> {
    ordered(rows)
        .into_iter()
        .filter(|row| row.valid_from >= start && row.valid_from < end)
        .collect()
}

/// The latest row per account with `valid_from <= as_of`, keyed by account id.
#[must_use]
pub fn latest_per_account(
    rows: &[AccountHistory],
    as_of: DateTime<Utc>,
) -> BTreeMap<AccountId, &AccountHistory> {
    let mut latest = BTreeMap::new();
    for row in ordered(rows).into_iter().filter(|row| row.valid_from <= as_of) {
        latest.insert(row.account_id, row);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountConfiguration, AccountType};
    use crate::history::TemporalHistoryRecorder;
    use chrono::Duration;
    use coopbank_shared::types::{BranchId, CurrencyId, OrganizationId, Scope, UserId};
    use rust_decimal_macros::dec;

    fn config() -> AccountConfiguration {
        AccountConfiguration::new(
            AccountId::new(),
            Scope::new(OrganizationId::new(), BranchId::new()),
            "Time Deposit",
            AccountType::TimeDeposit,
            CurrencyId::new(),
        )
    }

    /// Applies a planned write to an in-memory row list.
    fn apply(rows: &mut Vec<AccountHistory>, write: crate::history::HistoryWrite) {
        if let Some(close) = write.close {
            let row = rows.iter_mut().find(|r| r.id == close.history_id).unwrap();
            row.valid_to = Some(close.valid_to);
        }
        rows.push(write.append);
    }

    fn open(rows: &[AccountHistory]) -> Option<&AccountHistory> {
        rows.iter().find(|r| r.is_open())
    }

    #[test]
    fn test_rate_change_resolves_by_timestamp() {
        let t0 = Utc::now();
        let v1 = config();
        let mut rows = Vec::new();
        let write =
            TemporalHistoryRecorder::record_create(None, &v1, UserId::new(), t0).unwrap();
        apply(&mut rows, write);

        let mut v2 = v1.clone();
        v2.interest.standard = dec!(5);
        let t1 = t0 + Duration::days(10);
        let write = TemporalHistoryRecorder::record_update(
            open(&rows),
            &v1,
            &v2,
            UserId::new(),
            t1,
        )
        .unwrap();
        apply(&mut rows, write);

        assert!(check_gapless(&rows).is_ok());
        let before = resolve_as_of(&rows, t0 + Duration::days(3)).unwrap();
        assert_eq!(before.snapshot.interest.standard, v1.interest.standard);
        let at_change = resolve_as_of(&rows, t1).unwrap();
        assert_eq!(at_change.snapshot.interest.standard, dec!(5));
        assert!(resolve_as_of(&rows, t0 - Duration::seconds(1)).is_none());
    }

    #[test]
    fn test_deleted_account_resolves_to_terminal_row() {
        let t0 = Utc::now();
        let v1 = config();
        let mut rows = Vec::new();
        apply(
            &mut rows,
            TemporalHistoryRecorder::record_create(None, &v1, UserId::new(), t0).unwrap(),
        );
        let t1 = t0 + Duration::days(1);
        let write =
            TemporalHistoryRecorder::record_delete(open(&rows), &v1, UserId::new(), t1).unwrap();
        apply(&mut rows, write);

        assert!(open(&rows).is_none());
        assert!(check_gapless(&rows).is_ok());
        let later = resolve_as_of(&rows, t1 + Duration::days(30)).unwrap();
        assert_eq!(later.change_type, crate::history::HistoryChangeType::Deleted);
    }

    #[test]
    fn test_gap_is_detected() {
        let t0 = Utc::now();
        let v1 = config();
        let mut rows = Vec::new();
        apply(
            &mut rows,
            TemporalHistoryRecorder::record_create(None, &v1, UserId::new(), t0).unwrap(),
        );
        let write =
            TemporalHistoryRecorder::record_update(open(&rows), &v1, &v1, UserId::new(), t0)
                .unwrap();
        apply(&mut rows, write);
        rows[0].valid_to = Some(t0 - Duration::seconds(1));
        assert!(check_gapless(&rows).is_err());
    }

    #[test]
    fn test_multiple_open_rows_detected() {
        let t0 = Utc::now();
        let v1 = config();
        let first = TemporalHistoryRecorder::record_create(None, &v1, UserId::new(), t0).unwrap();
        let second = TemporalHistoryRecorder::record_create(
            None,
            &v1,
            UserId::new(),
            t0 + Duration::seconds(1),
        )
        .unwrap();
        let rows = vec![first.append, second.append];
        assert_eq!(check_gapless(&rows), Err(TimelineViolation::MultipleOpen));
    }

    #[test]
    fn test_changed_in_range_and_latest() {
        let t0 = Utc::now();
        let a = config();
        let b = config();
        let mut rows = Vec::new();
        apply(
            &mut rows,
            TemporalHistoryRecorder::record_create(None, &a, UserId::new(), t0).unwrap(),
        );
        apply(
            &mut rows,
            TemporalHistoryRecorder::record_create(
                None,
                &b,
                UserId::new(),
                t0 + Duration::days(2),
            )
            .unwrap(),
        );

        let changed = changed_in_range(&rows, t0 + Duration::days(1), t0 + Duration::days(3));
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].account_id, b.account_id);

        let latest = latest_per_account(&rows, t0 + Duration::days(3));
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&a.account_id].valid_from, t0);
        assert_eq!(latest_per_account(&rows, t0 + Duration::days(1)).len(), 1);
        assert_eq!(changed_in_range(&rows, t0, t0 + Duration::days(2)).len(), 1);
    }
}
