//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository implementations of the core storage ports
//! - Database migrations

pub mod entities;
mod error;
pub mod migration;
pub mod repositories;

pub use repositories::{
    AccountRepository, HistoryRepository, LedgerRepository, MemberRepository,
    SavingsBatchRepository,
};

use std::sync::Arc;
use std::time::Duration;

use coopbank_core::savings::SavingsPorts;
use coopbank_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured limits.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );
    Database::connect(options).await
}

/// Wires the savings interest ports onto one connection pool.
#[must_use]
pub fn savings_ports(db: &DatabaseConnection) -> SavingsPorts {
    let ledgers = Arc::new(LedgerRepository::new(db.clone()));
    let batches = Arc::new(SavingsBatchRepository::new(db.clone()));
    SavingsPorts {
        batches: batches.clone(),
        eligibility: batches,
        deltas: ledgers.clone(),
        member_types: Arc::new(MemberRepository::new(db.clone())),
        postings: ledgers,
    }
}
