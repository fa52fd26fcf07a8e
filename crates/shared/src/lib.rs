//! Shared types, errors, and configuration for Coopbank.
//!
//! This crate provides common types used across all other crates:
//! - Exact decimal arithmetic for monetary values
//! - Typed IDs for type-safe entity references
//! - Organization/branch scoping
//! - Application-wide error types
//! - Configuration management and tracing setup

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
