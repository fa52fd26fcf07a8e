//! Temporal history of account configurations.
//!
//! Every create/update/delete appends one full snapshot. Ordered by
//! `valid_from`, an account's rows form a gapless, non-overlapping timeline.
//!
//! # Modules
//!
//! - `types` - history rows and the writes a recorder plans
//! - `recorder` - `TemporalHistoryRecorder` close/append planning
//! - `timeline` - pure point-in-time queries and invariant checks
//! - `cache` - cache for point-in-time lookups
//! - `store` - read-side collaborator port
//! - `service` - point-in-time query service
//! - `error` - history error types

pub mod cache;
pub mod error;
pub mod recorder;
pub mod service;
pub mod store;
pub mod timeline;
pub mod types;

#[cfg(test)]
mod recorder_props;

pub use cache::SnapshotCache;
pub use error::HistoryError;
pub use recorder::TemporalHistoryRecorder;
pub use service::HistoryService;
pub use store::HistoryReader;
pub use types::{AccountHistory, CloseOpenRow, HistoryChangeType, HistoryWrite};
