//! Balance series types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One signed movement on a member's account, `credit - debit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    /// Business date the movement applies to.
    pub entry_date: NaiveDate,
    /// Signed amount.
    pub amount: Decimal,
    /// When the movement was recorded, orders same-day deltas.
    pub recorded_at: DateTime<Utc>,
}

/// The ending balance of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBalance {
    /// Calendar day.
    pub date: NaiveDate,
    /// Balance after every delta dated that day.
    pub ending_balance: Decimal,
}
