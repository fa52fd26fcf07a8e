//! Normal-balance rules per general-ledger type.
//!
//! - Assets/Expenses: balance += debit - credit (debit-normal)
//! - Liabilities/Equity/Revenue: balance += credit - debit (credit-normal)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::GeneralLedgerType;

/// Which side increases an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Assets, Expenses).
    DebitNormal,
    /// Credit-normal accounts (Liabilities, Equity, Revenue).
    CreditNormal,
}

impl NormalBalance {
    /// Determines the normal side from a general-ledger type.
    ///
    /// Accounts without a GL classification are member deposit accounts,
    /// which the cooperative carries as liabilities.
    #[must_use]
    pub const fn for_gl_type(gl_type: Option<GeneralLedgerType>) -> Self {
        match gl_type {
            Some(GeneralLedgerType::Assets | GeneralLedgerType::Expenses) => Self::DebitNormal,
            Some(
                GeneralLedgerType::Liabilities
                | GeneralLedgerType::Equity
                | GeneralLedgerType::Revenue,
            )
            | None => Self::CreditNormal,
        }
    }

    /// Calculates the balance change for a line.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::DebitNormal => debit - credit,
            Self::CreditNormal => credit - debit,
        }
    }
}
