//! Application configuration management.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

/// Day-count convention used when computing savings interest unless overridden.
pub const DEFAULT_DAY_COUNT: DayCountConvention = DayCountConvention::Actual365;

/// Number of decimal places monetary amounts are rounded to.
pub const DEFAULT_MONEY_SCALE: u32 = 2;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Interest computation settings.
    #[serde(default)]
    pub interest: InterestConfig,
    /// Batch run settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How the length of an interest period is counted and annualised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCountConvention {
    /// Actual calendar days over a 365-day year.
    Actual365,
    /// Actual calendar days over a 360-day year.
    Actual360,
    /// 30-day months over a 360-day year (US 30/360 day rule).
    Thirty360,
}

impl DayCountConvention {
    /// Returns the number of days in the annualisation year.
    #[must_use]
    pub const fn annual_divisor(self) -> i64 {
        match self {
            Self::Actual365 => 365,
            Self::Actual360 | Self::Thirty360 => 360,
        }
    }

    /// Counts the days in `[start, end)` under this convention.
    #[must_use]
    pub fn days_between(self, start: NaiveDate, end: NaiveDate) -> i64 {
        match self {
            Self::Actual365 | Self::Actual360 => (end - start).num_days(),
            Self::Thirty360 => {
                let d1 = i64::from(start.day().min(30));
                let d2 = if d1 == 30 {
                    i64::from(end.day().min(30))
                } else {
                    i64::from(end.day())
                };
                let years = i64::from(end.year() - start.year());
                let months = i64::from(end.month()) - i64::from(start.month());
                360 * years + 30 * months + (d2 - d1)
            }
        }
    }
}

impl Default for DayCountConvention {
    fn default() -> Self {
        DEFAULT_DAY_COUNT
    }
}

/// Interest computation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InterestConfig {
    /// Day-count convention for annualised rates.
    #[serde(default)]
    pub day_count: DayCountConvention,
    /// Decimal places for interest and tax amounts.
    #[serde(default = "default_money_scale")]
    pub money_scale: u32,
}

fn default_money_scale() -> u32 {
    DEFAULT_MONEY_SCALE
}

impl Default for InterestConfig {
    fn default() -> Self {
        Self {
            day_count: DayCountConvention::default(),
            money_scale: DEFAULT_MONEY_SCALE,
        }
    }
}

/// Batch run settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of balance series fetched concurrently.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

fn default_fetch_concurrency() -> usize {
    16
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "coopbank=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COOPBANK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
