//! Exact fixed-point arithmetic for monetary values.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every interest, tax, and fine computation routes through `DecimalOps`,
//! which wraps `rust_decimal::Decimal` with checked operations so overflow
//! surfaces as an error instead of a panic.

use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors raised by checked decimal arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// The result does not fit in a `Decimal`.
    #[error("Decimal overflow in {operation}")]
    Overflow {
        /// The operation that overflowed.
        operation: &'static str,
    },

    /// Division by zero.
    #[error("Division by zero")]
    DivisionByZero,
}

/// Stateless decimal arithmetic service.
pub struct DecimalOps;

impl DecimalOps {
    /// Exact addition.
    pub fn add(a: Decimal, b: Decimal) -> Result<Decimal, ArithmeticError> {
        a.checked_add(b)
            .ok_or(ArithmeticError::Overflow { operation: "add" })
    }

    /// Exact subtraction.
    pub fn sub(a: Decimal, b: Decimal) -> Result<Decimal, ArithmeticError> {
        a.checked_sub(b)
            .ok_or(ArithmeticError::Overflow { operation: "sub" })
    }

    /// Exact multiplication.
    pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal, ArithmeticError> {
        a.checked_mul(b)
            .ok_or(ArithmeticError::Overflow { operation: "mul" })
    }

    /// Division, exact to 28 significant digits.
    pub fn div(a: Decimal, b: Decimal) -> Result<Decimal, ArithmeticError> {
        if b.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        a.checked_div(b)
            .ok_or(ArithmeticError::Overflow { operation: "div" })
    }

    /// Total ordering comparison.
    #[must_use]
    pub fn compare(a: Decimal, b: Decimal) -> Ordering {
        a.cmp(&b)
    }

    /// Sums a sequence of values exactly.
    ///
    /// Decimal addition is associative for values that do not overflow, so
    /// the result is independent of iteration order.
    pub fn sum<I>(values: I) -> Result<Decimal, ArithmeticError>
    where
        I: IntoIterator<Item = Decimal>,
    {
        values
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, value| Self::add(acc, value))
    }

    /// Arithmetic mean. Returns `None` for an empty sequence.
    pub fn mean(values: &[Decimal]) -> Result<Option<Decimal>, ArithmeticError> {
        if values.is_empty() {
            return Ok(None);
        }
        let total = Self::sum(values.iter().copied())?;
        Self::div(total, Decimal::from(values.len())).map(Some)
    }

    /// `amount × percentage / 100`.
    pub fn percent_of(amount: Decimal, percentage: Decimal) -> Result<Decimal, ArithmeticError> {
        Self::div(Self::mul(amount, percentage)?, Decimal::ONE_HUNDRED)
    }

    /// Simple annualised interest: `base × rate / 100 × days / divisor`.
    ///
    /// The multiplication is carried out before the divisions so the only
    /// inexact step is the final division.
    pub fn annualized_interest(
        base: Decimal,
        rate_percentage: Decimal,
        days: i64,
        annual_divisor: i64,
    ) -> Result<Decimal, ArithmeticError> {
        let numerator = Self::mul(Self::mul(base, rate_percentage)?, Decimal::from(days))?;
        let denominator = Self::mul(Decimal::ONE_HUNDRED, Decimal::from(annual_divisor))?;
        Self::div(numerator, denominator)
    }

    /// Rounds to `scale` decimal places using Banker's Rounding.
    #[must_use]
    pub fn round_money(value: Decimal, scale: u32) -> Decimal {
        value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
    }
}
