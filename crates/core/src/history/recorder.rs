//! Plans the history rows written alongside each account mutation.
//!
//! The recorder never touches storage. It turns "the open row, if any" plus
//! the configuration being written into a [`HistoryWrite`] the caller
//! applies inside the mutation's transaction.

use chrono::{DateTime, Utc};
use coopbank_shared::types::{AccountHistoryId, UserId};

use super::error::HistoryError;
use super::types::{AccountHistory, CloseOpenRow, HistoryChangeType, HistoryWrite};
use crate::account::AccountConfiguration;

/// Stateless planner for history writes.
pub struct TemporalHistoryRecorder;

impl TemporalHistoryRecorder {
    /// Plans the first row for a new account.
    ///
    /// # Arguments
    /// * `open` - The account's currently open row, expected absent
    /// * `config` - The configuration being created
    /// * `actor` - The creating user
    /// * `now` - Commit timestamp
    ///
    /// # Returns
    /// * `Ok(HistoryWrite)` with no close and one open `created` row
    /// * `Err(HistoryError::AlreadyRecorded)` if an open row exists
    pub fn record_create(
        open: Option<&AccountHistory>,
        config: &AccountConfiguration,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryWrite, HistoryError> {
        if open.is_some() {
            return Err(HistoryError::AlreadyRecorded(config.account_id));
        }
        Ok(HistoryWrite {
            close: None,
            append: Self::row(config, HistoryChangeType::Created, actor, now, None),
        })
    }

    /// Plans the close of the open row and the append of `new`.
    ///
    /// # Returns
    /// * `Ok(HistoryWrite)` closing the open row at `now` and appending an
    ///   open `updated` row starting at the same instant
    /// * `Err(HistoryError::NoOpenRow)` if the account has no open row
    /// * `Err(HistoryError::AccountMismatch)` if the snapshots disagree on the account
    pub fn record_update(
        open: Option<&AccountHistory>,
        prior: &AccountConfiguration,
        new: &AccountConfiguration,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryWrite, HistoryError> {
        Self::ensure_same_account(prior, new)?;
        let (close, at) = Self::close(open, prior, now)?;
        Ok(HistoryWrite {
            close: Some(close),
            append: Self::row(new, HistoryChangeType::Updated, actor, at, None),
        })
    }

    /// Plans the close of the open row and the append of a terminal row.
    ///
    /// The terminal row is closed at its own `valid_from`, so a deleted
    /// account has zero open rows.
    pub fn record_delete(
        open: Option<&AccountHistory>,
        final_config: &AccountConfiguration,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<HistoryWrite, HistoryError> {
        let (close, at) = Self::close(open, final_config, now)?;
        Ok(HistoryWrite {
            close: Some(close),
            append: Self::row(final_config, HistoryChangeType::Deleted, actor, at, Some(at)),
        })
    }

    fn ensure_same_account(
        prior: &AccountConfiguration,
        new: &AccountConfiguration,
    ) -> Result<(), HistoryError> {
        if prior.account_id == new.account_id {
            Ok(())
        } else {
            Err(HistoryError::AccountMismatch {
                expected: prior.account_id,
                found: new.account_id,
            })
        }
    }

    /// Clamps `now` so the closed row never ends before it starts.
    fn close(
        open: Option<&AccountHistory>,
        config: &AccountConfiguration,
        now: DateTime<Utc>,
    ) -> Result<(CloseOpenRow, DateTime<Utc>), HistoryError> {
        let open = open
            .filter(|row| row.is_open())
            .ok_or(HistoryError::NoOpenRow(config.account_id))?;
        if open.account_id != config.account_id {
            return Err(HistoryError::AccountMismatch {
                expected: config.account_id,
                found: open.account_id,
            });
        }
        let at = now.max(open.valid_from);
        Ok((
            CloseOpenRow {
                history_id: open.id,
                valid_to: at,
            },
            at,
        ))
    }

    fn row(
        config: &AccountConfiguration,
        change_type: HistoryChangeType,
        actor: UserId,
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> AccountHistory {
        AccountHistory {
            id: AccountHistoryId::new(),
            account_id: config.account_id,
            scope: config.scope,
            change_type,
            snapshot: config.clone(),
            valid_from,
            valid_to,
            recorded_by: actor,
        }
    }
}
