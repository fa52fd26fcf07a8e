//! Range checks run before any account mutation is attempted.

use rust_decimal::Decimal;

use super::error::AccountError;
use super::types::AccountConfiguration;

/// Maximum grace period in days.
pub const MAX_GRACE_DAYS: u32 = 365;

/// Maximum cut-off day.
pub const MAX_CUTOFF_DAYS: u32 = 30;

/// Maximum cut-off month.
pub const MAX_CUTOFF_MONTHS: u32 = 12;

/// Validates every invariant of an account configuration.
///
/// Fails on the first violation found.
pub fn validate(config: &AccountConfiguration) -> Result<(), AccountError> {
    if config.name.trim().is_empty() {
        return Err(AccountError::EmptyName);
    }
    if config.currency_id.is_none() {
        return Err(AccountError::MissingCurrency);
    }

    check_percentage("interest.standard", config.interest.standard)?;
    check_percentage("interest.secured", config.interest.secured)?;
    check_percentage("fines.amortization", config.fines.amortization)?;
    check_percentage("fines.maturity", config.fines.maturity)?;

    for (frequency, context, pct) in config.fine_schedule.cells() {
        check_percentage(&format!("fine_schedule.{frequency}.{context}"), pct)?;
    }
    for (channel, pct) in config.fine_schedule.cash_entries() {
        check_percentage(&format!("fine_schedule.{channel}"), pct)?;
    }

    check_grace("grace.amortization_days", config.grace.amortization_days)?;
    check_grace("grace.maturity_days", config.grace.maturity_days)?;
    check_grace("grace.additional_days", config.grace.additional_days)?;

    if config.cutoff.days > MAX_CUTOFF_DAYS {
        return Err(AccountError::CutoffDaysOutOfRange(config.cutoff.days));
    }
    if config.cutoff.months > MAX_CUTOFF_MONTHS {
        return Err(AccountError::CutoffMonthsOutOfRange(config.cutoff.months));
    }

    check_non_negative("savings.minimum_balance", config.savings.minimum_balance)?;
    check_non_negative(
        "savings.below_minimum_charge",
        config.savings.below_minimum_charge,
    )?;
    for tier in &config.savings.rate_tiers {
        if tier.from > tier.to || tier.from < Decimal::ZERO {
            return Err(AccountError::InvalidRateTier {
                from: tier.from,
                to: tier.to,
            });
        }
        check_percentage("savings.rate_tiers.rate", tier.rate)?;
    }
    for tier in &config.savings.year_tiers {
        if tier.from_year > tier.to_year {
            return Err(AccountError::InvalidYearTier {
                from_year: tier.from_year,
                to_year: tier.to_year,
            });
        }
        check_percentage("savings.year_tiers.rate", tier.rate)?;
    }
    for tier in &config.savings.date_tiers {
        if tier.from > tier.to {
            return Err(AccountError::InvalidDateTier {
                from: tier.from,
                to: tier.to,
            });
        }
        check_percentage("savings.date_tiers.rate", tier.rate)?;
    }

    Ok(())
}

fn check_percentage(field: &str, value: Decimal) -> Result<(), AccountError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(AccountError::PercentageOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_grace(field: &'static str, value: u32) -> Result<(), AccountError> {
    if value > MAX_GRACE_DAYS {
        return Err(AccountError::GracePeriodOutOfRange { field, value });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: Decimal) -> Result<(), AccountError> {
    if value < Decimal::ZERO {
        return Err(AccountError::NegativeAmount { field, value });
    }
    Ok(())
}
