//! Savings interest batches.
//!
//! Computes, prints and posts interest for every eligible (member, account)
//! pair of a savings product:
//! - `types` - batch, entry and parameter types
//! - `methodology` - the seven balance methodologies
//! - `engine` - pure, parallel per-pair computation
//! - `lifecycle` - the Draft, Printed, Posted state machine
//! - `store` - batch, eligibility and member type history ports
//! - `posting` - posting ports and journal lines
//! - `service` - orchestration over the ports

pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod methodology;
pub mod posting;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod lifecycle_props;

pub use engine::{BatchComputation, PairInput, SavingsInterestBatchEngine};
pub use error::SavingsError;
pub use lifecycle::{BatchAction, BatchLifecycle};
pub use methodology::{BalanceMethodology, MethodologyOutcome, methodology_by_label, methodology_for};
pub use posting::{PairFailure, PostingReport, PostingStore, PostingUnit, posting_lines};
pub use service::{PostOutcome, SavingsInterestService, SavingsPorts};
pub use store::{BatchStore, BatchTotals, EligibilitySource, MemberTypeHistorySource};
pub use types::{
    BatchFilter, BatchStatus, CreateBatchParams, EligiblePair, PostParams, PostStamp, PrintStamp,
    SavingsComputationType, SavingsInterestBatch, SavingsInterestEntry,
};
