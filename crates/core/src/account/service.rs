//! Account configuration mutations.
//!
//! Every mutation validates first, then runs in one unit of work that locks
//! the row, writes the record, and records history. Events are published
//! only after commit.

use std::sync::Arc;

use chrono::Utc;
use coopbank_shared::types::{AccountId, Scope};
use tracing::{info, instrument, warn};

use super::error::AccountError;
use super::store::{AccountStore, AccountUnit};
use super::types::{AccountConfiguration, AccountRecord, Deletion};
use super::validation::validate;
use crate::actor::ActorContext;
use crate::events::{DomainEvent, EntityKind, EventAction, EventSink, Mutation};
use crate::guard::{ConcurrencyGuard, GuardError, RowLock};
use crate::history::TemporalHistoryRecorder;
use crate::store::StoreError;

/// Creates, saves and deletes account configurations.
#[derive(Clone)]
pub struct AccountConfigurationService {
    store: Arc<dyn AccountStore>,
    events: Arc<dyn EventSink>,
}

impl AccountConfigurationService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Reads an account, deleted or not.
    ///
    /// # Errors
    ///
    /// * `AccountError::NotFound` if no such account exists
    /// * `AccountError::Store` on collaborator failure
    pub async fn get(&self, account_id: AccountId) -> Result<AccountRecord, AccountError> {
        self.store
            .find(account_id)
            .await?
            .ok_or(AccountError::NotFound(account_id))
    }

    /// Lists live accounts in a scope.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Store` on collaborator failure.
    pub async fn list(&self, scope: Scope) -> Result<Vec<AccountRecord>, AccountError> {
        Ok(self.store.list(scope).await?)
    }

    /// Creates an account and its first history row.
    ///
    /// # Arguments
    ///
    /// * `actor` - Acting user and the scope they act in
    /// * `config` - Full configuration of the new account
    ///
    /// # Errors
    ///
    /// * Any validation error from [`validate`]
    /// * `AccountError::ScopeMismatch` if `config.scope` is not the actor's scope
    /// * `AccountError::AlreadyExists` if the id is taken
    /// * `AccountError::DuplicateName` if the name is taken in the scope
    #[instrument(skip_all, fields(account_id = %config.account_id, user_id = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &ActorContext,
        config: AccountConfiguration,
    ) -> Result<Mutation<AccountRecord>, AccountError> {
        validate(&config)?;
        if config.scope != actor.scope {
            return Err(AccountError::ScopeMismatch);
        }

        let account_id = config.account_id;
        let mut unit = self.store.begin().await?;

        let existing = RowLock::<AccountRecord>::find_for_update(&mut *unit, &account_id).await?;
        if existing.is_some() {
            return Err(AccountError::AlreadyExists(account_id));
        }
        Self::ensure_name_free(&mut *unit, &config, None).await?;

        let open = unit.open_history(account_id).await?;
        let write = TemporalHistoryRecorder::record_create(
            open.as_ref(),
            &config,
            actor.user_id,
            Utc::now(),
        )?;
        let record = AccountRecord::created(config, actor.user_id, write.append.valid_from);

        unit.insert(&record)
            .await
            .map_err(|e| Self::map_unique(e, &record.configuration.name))?;
        unit.apply_history(&write).await?;
        unit.commit().await?;

        info!(name = %record.configuration.name, "account created");
        Ok(self.publish(record, EventAction::Create, actor))
    }

    /// Saves a new configuration for an existing account.
    ///
    /// `expected` is the record the caller read before editing; the row is
    /// locked and compared against it before anything is written.
    ///
    /// # Errors
    ///
    /// * Any validation error from [`validate`]
    /// * `AccountError::ImmutableField` if the id, type or scope changes
    /// * `AccountError::Guard` if the row changed identity since `expected`
    /// * `AccountError::AlreadyDeleted` if the account is deleted
    /// * `AccountError::DuplicateName` if the new name is taken
    #[instrument(skip_all, fields(account_id = %expected.account_id(), user_id = %actor.user_id))]
    pub async fn save(
        &self,
        actor: &ActorContext,
        expected: &AccountRecord,
        config: AccountConfiguration,
    ) -> Result<Mutation<AccountRecord>, AccountError> {
        validate(&config)?;
        let account_id = expected.account_id();
        if config.account_id != account_id {
            return Err(AccountError::ImmutableField("account_id"));
        }

        let mut unit = self.store.begin().await?;
        let current = Self::lock(&mut *unit, expected).await?;
        Self::ensure_mutable(actor, &current)?;
        if config.account_type != current.configuration.account_type {
            return Err(AccountError::ImmutableField("account_type"));
        }
        if config.scope != current.configuration.scope {
            return Err(AccountError::ImmutableField("scope"));
        }
        if config.name != current.configuration.name {
            Self::ensure_name_free(&mut *unit, &config, Some(account_id)).await?;
        }

        let open = unit.open_history(account_id).await?;
        let write = TemporalHistoryRecorder::record_update(
            open.as_ref(),
            &current.configuration,
            &config,
            actor.user_id,
            Utc::now(),
        )?;
        let record = AccountRecord {
            configuration: config,
            updated_by: actor.user_id,
            updated_at: write.append.valid_from,
            ..current
        };

        unit.update(&record)
            .await
            .map_err(|e| Self::map_unique(e, &record.configuration.name))?;
        unit.apply_history(&write).await?;
        unit.commit().await?;

        info!("account configuration saved");
        Ok(self.publish(record, EventAction::Update, actor))
    }

    /// Soft-deletes an account, closing its history.
    ///
    /// # Errors
    ///
    /// * `AccountError::Guard` if the row changed identity since `expected`
    /// * `AccountError::AlreadyDeleted` if already deleted
    #[instrument(skip_all, fields(account_id = %expected.account_id(), user_id = %actor.user_id))]
    pub async fn delete(
        &self,
        actor: &ActorContext,
        expected: &AccountRecord,
    ) -> Result<Mutation<AccountRecord>, AccountError> {
        let account_id = expected.account_id();
        let mut unit = self.store.begin().await?;
        let current = Self::lock(&mut *unit, expected).await?;
        Self::ensure_mutable(actor, &current)?;

        let open = unit.open_history(account_id).await?;
        let write = TemporalHistoryRecorder::record_delete(
            open.as_ref(),
            &current.configuration,
            actor.user_id,
            Utc::now(),
        )?;
        let at = write.append.valid_from;
        let record = AccountRecord {
            updated_by: actor.user_id,
            updated_at: at,
            deleted: Some(Deletion {
                deleted_by: actor.user_id,
                deleted_at: at,
            }),
            ..current
        };

        unit.update(&record).await?;
        unit.apply_history(&write).await?;
        unit.commit().await?;

        info!("account deleted");
        Ok(self.publish(record, EventAction::Delete, actor))
    }

    async fn lock(
        unit: &mut dyn AccountUnit,
        expected: &AccountRecord,
    ) -> Result<AccountRecord, AccountError> {
        let account_id = expected.account_id();
        ConcurrencyGuard::lock_with_validation(unit, &account_id, expected)
            .await
            .map_err(|err| match err {
                GuardError::NotFound(_) => AccountError::NotFound(account_id),
                other => {
                    warn!(error = %other, "account lock validation failed");
                    other.into()
                }
            })
    }

    fn ensure_mutable(actor: &ActorContext, current: &AccountRecord) -> Result<(), AccountError> {
        if current.is_deleted() {
            return Err(AccountError::AlreadyDeleted(current.account_id()));
        }
        if current.configuration.scope != actor.scope {
            return Err(AccountError::ScopeMismatch);
        }
        Ok(())
    }

    async fn ensure_name_free(
        unit: &mut dyn AccountUnit,
        config: &AccountConfiguration,
        excluding: Option<AccountId>,
    ) -> Result<(), AccountError> {
        if unit.name_taken(config.scope, &config.name, excluding).await? {
            return Err(AccountError::DuplicateName(config.name.clone()));
        }
        Ok(())
    }

    /// A unique index violation on write means another transaction won the name.
    fn map_unique(err: StoreError, name: &str) -> AccountError {
        match err {
            StoreError::UniqueViolation(_) => AccountError::DuplicateName(name.to_string()),
            other => other.into(),
        }
    }

    fn publish(
        &self,
        record: AccountRecord,
        action: EventAction,
        actor: &ActorContext,
    ) -> Mutation<AccountRecord> {
        let event = DomainEvent::new(
            action,
            EntityKind::Account,
            record.account_id().into_inner(),
            record.configuration.scope,
            actor.user_id,
            record.updated_at,
        );
        self.events.publish(&event);
        Mutation::with_event(record, event)
    }
}
