//! Property-based tests for the batch lifecycle.

use chrono::{NaiveDate, Utc};
use coopbank_shared::types::{AccountId, UserId};
use proptest::prelude::*;

use super::lifecycle::BatchLifecycle;
use super::types::{BatchStatus, PostParams};

#[derive(Debug, Clone, Copy)]
enum Op {
    Print,
    Post,
    Recompute,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Print), Just(Op::Post), Just(Op::Recompute)]
}

const fn rank(status: BatchStatus) -> u8 {
    match status {
        BatchStatus::Draft => 0,
        BatchStatus::Printed => 1,
        BatchStatus::Posted => 2,
    }
}

fn apply(status: BatchStatus, op: Op) -> Option<BatchStatus> {
    let user = UserId::new();
    let now = Utc::now();
    match op {
        Op::Print => BatchLifecycle::print(status, user, now)
            .ok()
            .map(|action| action.new_status()),
        Op::Post => {
            let params = PostParams {
                post_account_id: AccountId::new(),
                check_voucher_number: None,
                entry_date: None,
            };
            let end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
            BatchLifecycle::post(status, user, &params, end, now)
                .ok()
                .map(|action| action.new_status())
        }
        Op::Recompute => BatchLifecycle::ensure_draft(status).ok().map(|()| status),
    }
}

proptest! {
    /// Status never moves backwards, and every accepted change is a legal transition.
    #[test]
    fn prop_status_is_monotonic(ops in prop::collection::vec(op_strategy(), 0..20)) {
        let mut status = BatchStatus::Draft;
        for op in ops {
            if let Some(next) = apply(status, op) {
                prop_assert!(rank(next) >= rank(status));
                if next != status {
                    prop_assert!(BatchLifecycle::is_valid_transition(status, next));
                }
                status = next;
            }
        }
    }

    /// A posted batch accepts no further operation.
    #[test]
    fn prop_posted_is_terminal(op in op_strategy()) {
        prop_assert_eq!(apply(BatchStatus::Posted, op), None);
    }

    /// Posting is reachable only through printing.
    #[test]
    fn prop_post_needs_print(ops in prop::collection::vec(op_strategy(), 0..20)) {
        let mut status = BatchStatus::Draft;
        let mut printed = false;
        for op in ops {
            if let Some(next) = apply(status, op) {
                printed |= next == BatchStatus::Printed;
                if next == BatchStatus::Posted {
                    prop_assert!(printed);
                }
                status = next;
            }
        }
    }
}
