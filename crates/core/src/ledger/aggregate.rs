//! The per (member, account) ledger aggregate.

use chrono::{DateTime, Utc};
use coopbank_shared::types::{ArithmeticError, DecimalOps, MemberLedgerId, Scope};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::LedgerKey;
use crate::guard::{LockIdentity, Lockable};

/// Running totals of one member's activity on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLedger {
    /// Aggregate id.
    pub id: MemberLedgerId,
    /// Owning key.
    pub key: LedgerKey,
    /// Current balance.
    pub balance: Decimal,
    /// Interest credited to date.
    pub interest: Decimal,
    /// Fines charged to date.
    pub fines: Decimal,
    /// Amount currently due.
    pub due: Decimal,
    /// Due amount carried forward from earlier periods.
    pub carried_forward_due: Decimal,
    /// Stored value facility balance.
    pub stored_value_facility: Decimal,
    /// Principal currently due.
    pub principal_due: Decimal,
    /// Number of postings applied.
    pub count: i64,
    /// Last payment timestamp.
    pub last_pay: Option<DateTime<Utc>>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl MemberLedger {
    /// Creates an empty aggregate for a key that has never been posted to.
    #[must_use]
    pub fn open(key: LedgerKey, now: DateTime<Utc>) -> Self {
        Self {
            id: MemberLedgerId::new(),
            key,
            balance: Decimal::ZERO,
            interest: Decimal::ZERO,
            fines: Decimal::ZERO,
            due: Decimal::ZERO,
            carried_forward_due: Decimal::ZERO,
            stored_value_facility: Decimal::ZERO,
            principal_due: Decimal::ZERO,
            count: 0,
            last_pay: None,
            updated_at: now,
        }
    }

    /// The identity of aggregate `id` in `scope`.
    ///
    /// A row found under the same key with a different id replaced the one
    /// read earlier.
    #[must_use]
    pub fn identity_of(scope: Scope, id: MemberLedgerId) -> LockIdentity {
        LockIdentity::new(scope, format!("member_ledger:{id}"))
    }

    /// Credits interest and withholds tax.
    ///
    /// A negative `interest` is a below-minimum-balance charge and reduces
    /// the balance without touching the interest accumulator.
    pub fn apply_interest(
        &mut self,
        interest: Decimal,
        tax: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(), ArithmeticError> {
        let net = DecimalOps::sub(interest, tax)?;
        self.balance = DecimalOps::add(self.balance, net)?;
        if interest > Decimal::ZERO {
            self.interest = DecimalOps::add(self.interest, interest)?;
        }
        self.count += 1;
        self.updated_at = at;
        Ok(())
    }
}

impl Lockable for MemberLedger {
    type Key = LedgerKey;

    fn lock_identity(&self) -> LockIdentity {
        Self::identity_of(self.key.scope, self.id)
    }
}
