//! Core business logic for Coopbank.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through async port traits implemented in `coopbank-db`.
//!
//! # Modules
//!
//! - `account` - Account configuration and its mutations
//! - `history` - Temporal history of account configurations
//! - `fines` - Fine schedule resolution
//! - `balance` - Daily balance reconstruction
//! - `savings` - Savings interest batches
//! - `ledger` - Member ledger aggregates and posting lines
//! - `guard` - Row locks with identity validation
//! - `events` - Domain events

#[macro_use]
mod macros;

pub mod account;
pub mod actor;
pub mod balance;
pub mod events;
pub mod fines;
pub mod guard;
pub mod history;
pub mod ledger;
pub mod savings;
pub mod store;

#[cfg(test)]
mod test_support;

pub use actor::ActorContext;
pub use events::{DomainEvent, EventSink, Mutation};
pub use store::{StoreError, StoreResult};
