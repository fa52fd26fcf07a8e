//! Point-in-time snapshot caching using Moka.
//!
//! History rows are immutable once closed, so an `(account, instant)` pair
//! resolved to a closed row never changes. Batch runs resolve the same
//! configuration many times; this cache absorbs the repeats.

use chrono::{DateTime, Utc};
use coopbank_shared::types::AccountId;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::types::AccountHistory;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default time-to-live for cache entries (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

/// Cache for point-in-time history lookups.
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Cache<(AccountId, DateTime<Utc>), Arc<AccountHistory>>,
}

impl SnapshotCache {
    /// Creates a new snapshot cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a new snapshot cache with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries to cache
    /// * `ttl_secs` - Time-to-live in seconds for each entry
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the cached row for `account_id` at `at`, if any.
    #[must_use]
    pub fn get(&self, account_id: AccountId, at: DateTime<Utc>) -> Option<Arc<AccountHistory>> {
        self.cache.get(&(account_id, at))
    }

    /// Caches a resolved row.
    pub fn insert(&self, account_id: AccountId, at: DateTime<Utc>, row: Arc<AccountHistory>) {
        self.cache.insert((account_id, at), row);
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}
