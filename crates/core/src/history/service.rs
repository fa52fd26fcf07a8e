//! Point-in-time history queries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coopbank_shared::types::{AccountId, Scope};
use tracing::{debug, instrument};

use super::cache::SnapshotCache;
use super::error::HistoryError;
use super::store::HistoryReader;
use super::timeline;
use super::types::{AccountHistory, HistoryChangeType};
use crate::account::AccountConfiguration;

/// Answers "what was this account's configuration at time T".
#[derive(Clone)]
pub struct HistoryService {
    reader: Arc<dyn HistoryReader>,
    cache: SnapshotCache,
}

impl HistoryService {
    /// Creates a service over `reader` with a default cache.
    #[must_use]
    pub fn new(reader: Arc<dyn HistoryReader>) -> Self {
        Self::with_cache(reader, SnapshotCache::new())
    }

    /// Creates a service with an explicit cache.
    #[must_use]
    pub fn with_cache(reader: Arc<dyn HistoryReader>, cache: SnapshotCache) -> Self {
        Self { reader, cache }
    }

    /// Resolves the row in force at `at`.
    ///
    /// Falls back to the latest row at or before `at` when no interval
    /// contains it. Only settled results are cached: a closed row containing
    /// `at`, or the terminal row of a deleted account.
    ///
    /// # Errors
    ///
    /// * `HistoryError::NotFound` if `at` predates the account
    /// * `HistoryError::Store` on collaborator failure
    #[instrument(skip(self), level = "debug")]
    pub async fn as_of(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Arc<AccountHistory>, HistoryError> {
        if let Some(row) = self.cache.get(account_id, at) {
            return Ok(row);
        }

        let row = match self.reader.containing(account_id, at).await? {
            Some(row) => row,
            None => self
                .reader
                .latest_at_or_before(account_id, at)
                .await?
                .ok_or(HistoryError::NotFound { account_id, at })?,
        };
        let row = Arc::new(row);

        // An open row can still be closed by a concurrent save.
        if Self::settled(&row, at) {
            self.cache.insert(account_id, at, Arc::clone(&row));
        }
        debug!(%account_id, history_id = %row.id, "resolved history snapshot");
        Ok(row)
    }

    fn settled(row: &AccountHistory, at: DateTime<Utc>) -> bool {
        match row.valid_to {
            Some(end) => at < end || row.change_type == HistoryChangeType::Deleted,
            None => false,
        }
    }

    /// Resolves the configuration in force at `at`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::as_of`].
    pub async fn configuration_as_of(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<AccountConfiguration, HistoryError> {
        Ok(self.as_of(account_id, at).await?.snapshot.clone())
    }

    /// All rows for an account, ordered by `valid_from`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Store` on collaborator failure.
    pub async fn timeline(&self, account_id: AccountId) -> Result<Vec<AccountHistory>, HistoryError> {
        Ok(self.reader.timeline(account_id).await?)
    }

    /// Rows in a scope whose `valid_from` falls in `[start, end)`.
    ///
    /// # Errors
    ///
    /// * `HistoryError::InvalidRange` if `end < start`
    /// * `HistoryError::Store` on collaborator failure
    pub async fn changed_in_range(
        &self,
        scope: Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AccountHistory>, HistoryError> {
        if end < start {
            return Err(HistoryError::InvalidRange { start, end });
        }
        Ok(self.reader.changed_in_range(scope, start, end).await?)
    }

    /// The snapshot in force at `as_of` for every account in a scope.
    ///
    /// Includes terminal rows of accounts deleted before `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Store` on collaborator failure.
    pub async fn latest_per_account(
        &self,
        scope: Scope,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<AccountHistory>, HistoryError> {
        let rows = self.reader.scope_timeline(scope, as_of).await?;
        Ok(timeline::latest_per_account(&rows, as_of)
            .into_values()
            .cloned()
            .collect())
    }
}
