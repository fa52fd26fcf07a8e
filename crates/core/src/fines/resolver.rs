//! Grace-period and frequency-bucket selection.

use coopbank_shared::types::DecimalOps;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::FineError;
use crate::account::{AccountConfiguration, FineContext, FineFrequency};

/// How the overdue amount is being settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Regular accrual by elapsed time.
    #[default]
    Periodic,
    /// Final settlement; selects the lumpsum bucket.
    Terminal,
}

/// The outcome of a fine resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineResolution {
    /// Percentage of the due amount to charge, in `[0, 100]`.
    pub percentage: Decimal,
    /// Bucket used, `None` when no fine applies.
    pub frequency: Option<FineFrequency>,
    /// True when no fine applies because the grace period has not run out.
    pub in_grace: bool,
}

impl FineResolution {
    const fn none(in_grace: bool) -> Self {
        Self {
            percentage: Decimal::ZERO,
            frequency: None,
            in_grace,
        }
    }

    /// Fine owed on `due_amount`, rounded to `scale` decimal places.
    ///
    /// # Errors
    ///
    /// Returns `FineError::Arithmetic` on overflow.
    pub fn fine_amount(&self, due_amount: Decimal, scale: u32) -> Result<Decimal, FineError> {
        let raw = DecimalOps::percent_of(due_amount, self.percentage)?;
        Ok(DecimalOps::round_money(raw, scale))
    }
}

/// Stateless fine resolver.
pub struct FineScheduleResolver;

impl FineScheduleResolver {
    /// Resolves the fine percentage for `elapsed_days` overdue.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration in force, possibly a historical snapshot
    /// * `context` - Installment or maturity fine
    /// * `elapsed_days` - Days since the due date
    /// * `settlement` - `Terminal` to select the lumpsum bucket
    ///
    /// # Returns
    ///
    /// After `context` grace plus additional grace, the largest periodic
    /// bucket whose period fits in the remaining days. With
    /// `no_grace_period_daily` set, days still inside grace accrue at the
    /// daily rate instead of being free. Non-positive elapsed days never fine.
    /// An unset schedule cell falls back to the context's base fine rate.
    ///
    /// # Errors
    ///
    /// Returns `FineError::InvalidConfiguration` if the selected percentage is
    /// outside `[0, 100]`.
    pub fn resolve(
        config: &AccountConfiguration,
        context: FineContext,
        elapsed_days: i64,
        settlement: Settlement,
    ) -> Result<FineResolution, FineError> {
        if elapsed_days <= 0 {
            return Ok(FineResolution::none(false));
        }

        let grace = i64::from(config.grace.total_for(context));
        let remainder = elapsed_days - grace;

        let frequency = if remainder <= 0 {
            if !config.grace.no_grace_period_daily {
                return Ok(FineResolution::none(true));
            }
            FineFrequency::Daily
        } else if settlement == Settlement::Terminal {
            FineFrequency::Lumpsum
        } else {
            Self::bucket_for(remainder)
        };

        let percentage = Self::percentage(config, frequency, context)?;
        Ok(FineResolution {
            percentage,
            frequency: Some(frequency),
            in_grace: false,
        })
    }

    /// Largest periodic bucket whose period is at most `days`.
    #[must_use]
    pub fn bucket_for(days: i64) -> FineFrequency {
        FineFrequency::PERIODIC
            .iter()
            .copied()
            .filter(|frequency| frequency.period_days().is_some_and(|period| period <= days))
            .max_by_key(|frequency| frequency.period_days())
            .unwrap_or(FineFrequency::Daily)
    }

    fn percentage(
        config: &AccountConfiguration,
        frequency: FineFrequency,
        context: FineContext,
    ) -> Result<Decimal, FineError> {
        let value = config
            .fine_schedule
            .rate(frequency, context)
            .unwrap_or_else(|| config.fines.base(context));
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(FineError::InvalidConfiguration {
                frequency,
                context,
                value,
            });
        }
        Ok(value)
    }
}
