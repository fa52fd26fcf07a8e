//! Per-account interest and fines configuration.
//!
//! # Modules
//!
//! - `types` - `AccountConfiguration` value object and its parts
//! - `schedule` - fine schedule matrix and ledger-source visibility flags
//! - `validation` - range checks run before any mutation
//! - `error` - account error types
//! - `store` - persistence collaborator ports
//! - `service` - create/save/delete with history capture

pub mod error;
pub mod schedule;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use error::AccountError;
pub use schedule::{
    CashFineChannel, ContextRates, FineContext, FineFrequency, FineSchedule, LedgerSource,
    LedgerSourceVisibility,
};
pub use service::AccountConfigurationService;
pub use store::{AccountStore, AccountUnit};
pub use types::{
    AccountConfiguration, AccountRecord, AccountType, ComputationType, Cutoff, DateRateTier,
    Deletion, FineRates, GeneralLedgerType, GracePeriods, InterestRateBasis, InterestRates,
    RateTier, SavingsTerms, YearRateTier,
};
pub use validation::validate;
