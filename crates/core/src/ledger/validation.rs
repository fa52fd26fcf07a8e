//! Business rule validation for posting lines.

use coopbank_shared::types::{ArithmeticError, DecimalOps};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{EntryType, PostingLine};

/// Validation errors for posting lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Lines do not balance.
    #[error("Posting is unbalanced: debits ({debits}) != credits ({credits})")]
    Unbalanced {
        /// Total debit amount.
        debits: Decimal,
        /// Total credit amount.
        credits: Decimal,
    },

    /// Posting has no lines.
    #[error("Posting must have at least one line")]
    NoEntries,

    /// Posting has only one side (all debits or all credits).
    #[error("Posting must have both debit and credit lines")]
    SingleSided,

    /// Line amount is zero or negative.
    #[error("Line amount must be positive")]
    InvalidAmount,

    /// Arithmetic overflow.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Validates that a set of posting lines is balanced.
///
/// Returns the common debit/credit total.
pub fn validate_lines(lines: &[PostingLine]) -> Result<Decimal, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoEntries);
    }

    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;
    let mut has_debit = false;
    let mut has_credit = false;

    for line in lines {
        if line.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        match line.entry_type {
            EntryType::Debit => {
                debits = DecimalOps::add(debits, line.amount)?;
                has_debit = true;
            }
            EntryType::Credit => {
                credits = DecimalOps::add(credits, line.amount)?;
                has_credit = true;
            }
        }
    }

    if !has_debit || !has_credit {
        return Err(LedgerError::SingleSided);
    }

    if debits != credits {
        return Err(LedgerError::Unbalanced { debits, credits });
    }

    Ok(debits)
}
