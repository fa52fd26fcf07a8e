//! Fine percentage resolution from elapsed overdue days.
//!
//! # Modules
//!
//! - `resolver` - `FineScheduleResolver` grace and bucket selection
//! - `error` - fine error types

pub mod error;
pub mod resolver;

pub use error::FineError;
pub use resolver::{FineResolution, FineScheduleResolver, Settlement};
