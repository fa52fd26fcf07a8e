//! Batch lifecycle state machine.
//!
//! `Draft -> Printed -> Posted`, one-directional. No state is re-entered.

use chrono::{DateTime, Utc};
use coopbank_shared::types::UserId;

use super::error::SavingsError;
use super::types::{BatchStatus, PostParams, PostStamp, PrintStamp};

/// A validated lifecycle transition and its audit stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchAction {
    /// Draft to Printed.
    Print {
        /// Always `Printed`.
        new_status: BatchStatus,
        /// Audit stamp.
        stamp: PrintStamp,
    },
    /// Printed to Posted.
    Post {
        /// Always `Posted`.
        new_status: BatchStatus,
        /// Audit stamp.
        stamp: PostStamp,
    },
}

impl BatchAction {
    /// The state the batch must currently be in.
    #[must_use]
    pub const fn from_status(&self) -> BatchStatus {
        match self {
            Self::Print { .. } => BatchStatus::Draft,
            Self::Post { .. } => BatchStatus::Printed,
        }
    }

    /// The state the batch moves to.
    #[must_use]
    pub const fn new_status(&self) -> BatchStatus {
        match self {
            Self::Print { new_status, .. } | Self::Post { new_status, .. } => *new_status,
        }
    }
}

/// Stateless lifecycle transitions.
pub struct BatchLifecycle;

impl BatchLifecycle {
    /// Freezes a draft batch.
    ///
    /// # Returns
    /// * `Ok(BatchAction::Print)` if the batch is Draft
    /// * `Err(SavingsError::InvalidState)` otherwise
    pub fn print(
        current: BatchStatus,
        printed_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<BatchAction, SavingsError> {
        match current {
            BatchStatus::Draft => Ok(BatchAction::Print {
                new_status: BatchStatus::Printed,
                stamp: PrintStamp {
                    printed_by,
                    printed_at: now,
                },
            }),
            _ => Err(SavingsError::InvalidState {
                from: current,
                to: BatchStatus::Printed,
            }),
        }
    }

    /// Marks a printed batch as posted.
    ///
    /// # Arguments
    /// * `current` - Current batch status
    /// * `posted_by` - The posting user
    /// * `params` - Post account, voucher and entry date
    /// * `default_entry_date` - Used when `params.entry_date` is absent
    /// * `now` - Completion time
    ///
    /// # Returns
    /// * `Ok(BatchAction::Post)` if the batch is Printed
    /// * `Err(SavingsError::InvalidState)` otherwise, including an already
    ///   posted batch
    pub fn post(
        current: BatchStatus,
        posted_by: UserId,
        params: &PostParams,
        default_entry_date: chrono::NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<BatchAction, SavingsError> {
        match current {
            BatchStatus::Printed => Ok(BatchAction::Post {
                new_status: BatchStatus::Posted,
                stamp: PostStamp {
                    posted_by,
                    posted_at: now,
                    post_account_id: params.post_account_id,
                    check_voucher_number: params.check_voucher_number.clone(),
                    entry_date: params.entry_date.unwrap_or(default_entry_date),
                },
            }),
            _ => Err(SavingsError::InvalidState {
                from: current,
                to: BatchStatus::Posted,
            }),
        }
    }

    /// Checks the batch can still be recomputed.
    ///
    /// # Errors
    /// Returns `SavingsError::InvalidState` unless the batch is Draft.
    pub fn ensure_draft(current: BatchStatus) -> Result<(), SavingsError> {
        match current {
            BatchStatus::Draft => Ok(()),
            _ => Err(SavingsError::InvalidState {
                from: current,
                to: BatchStatus::Draft,
            }),
        }
    }

    /// Checks if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Printed (print)
    /// - Printed → Posted (post)
    #[must_use]
    pub fn is_valid_transition(from: BatchStatus, to: BatchStatus) -> bool {
        matches!(
            (from, to),
            (BatchStatus::Draft, BatchStatus::Printed) | (BatchStatus::Printed, BatchStatus::Posted)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use coopbank_shared::types::AccountId;

    fn post_params() -> PostParams {
        PostParams {
            post_account_id: AccountId::new(),
            check_voucher_number: Some("CV-001".into()),
            entry_date: None,
        }
    }

    fn period_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn test_print_from_draft() {
        let user = UserId::new();
        let now = Utc::now();
        let action = BatchLifecycle::print(BatchStatus::Draft, user, now).unwrap();
        assert_eq!(action.new_status(), BatchStatus::Printed);
        assert_eq!(action.from_status(), BatchStatus::Draft);
        match action {
            BatchAction::Print { stamp, .. } => {
                assert_eq!(stamp.printed_by, user);
                assert_eq!(stamp.printed_at, now);
            }
            BatchAction::Post { .. } => panic!("expected print"),
        }
    }

    #[test]
    fn test_print_twice_fails() {
        let result = BatchLifecycle::print(BatchStatus::Printed, UserId::new(), Utc::now());
        assert_eq!(
            result,
            Err(SavingsError::InvalidState {
                from: BatchStatus::Printed,
                to: BatchStatus::Printed,
            })
        );
    }

    #[test]
    fn test_post_requires_printed() {
        let result = BatchLifecycle::post(
            BatchStatus::Draft,
            UserId::new(),
            &post_params(),
            period_end(),
            Utc::now(),
        );
        assert!(matches!(result, Err(SavingsError::InvalidState { .. })));
    }

    #[test]
    fn test_repost_fails() {
        let result = BatchLifecycle::post(
            BatchStatus::Posted,
            UserId::new(),
            &post_params(),
            period_end(),
            Utc::now(),
        );
        assert_eq!(
            result,
            Err(SavingsError::InvalidState {
                from: BatchStatus::Posted,
                to: BatchStatus::Posted,
            })
        );
    }

    #[test]
    fn test_post_defaults_entry_date() {
        let action = BatchLifecycle::post(
            BatchStatus::Printed,
            UserId::new(),
            &post_params(),
            period_end(),
            Utc::now(),
        )
        .unwrap();
        match action {
            BatchAction::Post { stamp, .. } => {
                assert_eq!(stamp.entry_date, period_end());
                assert_eq!(stamp.check_voucher_number.as_deref(), Some("CV-001"));
            }
            BatchAction::Print { .. } => panic!("expected post"),
        }
    }

    #[test]
    fn test_recompute_only_in_draft() {
        assert!(BatchLifecycle::ensure_draft(BatchStatus::Draft).is_ok());
        assert!(BatchLifecycle::ensure_draft(BatchStatus::Printed).is_err());
        assert!(BatchLifecycle::ensure_draft(BatchStatus::Posted).is_err());
    }
}
