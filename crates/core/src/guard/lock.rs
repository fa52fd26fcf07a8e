//! Pessimistic row locks with identity validation.

use std::fmt;

use async_trait::async_trait;
use coopbank_shared::types::Scope;
use serde::{Deserialize, Serialize};

use super::error::GuardError;
use crate::store::StoreResult;

/// The immutable identity fields of a lockable row.
///
/// Two snapshots of the same row must agree on these; a difference means
/// the row was replaced between an earlier read and the lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockIdentity {
    /// Owning scope.
    pub scope: Scope,
    /// Type discriminator, e.g. the account type label.
    pub kind: String,
}

impl LockIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(scope: Scope, kind: impl Into<String>) -> Self {
        Self {
            scope,
            kind: kind.into(),
        }
    }
}

impl fmt::Display for LockIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.kind, self.scope)
    }
}

/// A row that can be locked for update.
pub trait Lockable: Send + Sync + 'static {
    /// Primary key type.
    type Key: fmt::Debug + Send + Sync + 'static;

    /// Returns the row's immutable identity fields.
    fn lock_identity(&self) -> LockIdentity;
}

/// An open transaction able to lock rows of type `E`.
///
/// Implementations hold the lock until the transaction commits or is
/// dropped.
#[async_trait]
pub trait RowLock<E: Lockable>: Send {
    /// Locks and returns the row, or `None` when it does not exist.
    async fn find_for_update(&mut self, key: &E::Key) -> StoreResult<Option<E>>;
}

/// Stateless lock helpers used by every mutating service.
pub struct ConcurrencyGuard;

impl ConcurrencyGuard {
    /// Locks a row for the duration of `tx`.
    ///
    /// # Errors
    /// * `GuardError::NotFound` if the row does not exist
    /// * `GuardError::Store` if the lock could not be acquired
    pub async fn lock_for_update<E, T>(tx: &mut T, key: &E::Key) -> Result<E, GuardError>
    where
        E: Lockable,
        T: RowLock<E> + ?Sized,
    {
        <T as RowLock<E>>::find_for_update(tx, key)
            .await?
            .ok_or_else(|| GuardError::NotFound(format!("{key:?}")))
    }

    /// Locks a row and checks it against an earlier snapshot.
    ///
    /// # Errors
    /// * `GuardError::Conflict` if scope or type differ from `expected`
    /// * Any error of [`ConcurrencyGuard::lock_for_update`]
    pub async fn lock_with_validation<E, T>(
        tx: &mut T,
        key: &E::Key,
        expected: &E,
    ) -> Result<E, GuardError>
    where
        E: Lockable,
        T: RowLock<E> + ?Sized,
    {
        let current = Self::lock_for_update(tx, key).await?;
        Self::validate_identity(&expected.lock_identity(), &current.lock_identity())?;
        Ok(current)
    }

    /// Locks a row that may not exist yet.
    ///
    /// Used for aggregates that are created on first write. With `expected`
    /// set the row was seen earlier, so it must still exist and match.
    ///
    /// # Errors
    /// * `GuardError::NotFound` if an expected row is gone
    /// * `GuardError::Conflict` if it no longer matches `expected`
    /// * `GuardError::Store` if the lock could not be acquired
    pub async fn lock_matching<E, T>(
        tx: &mut T,
        key: &E::Key,
        expected: Option<&LockIdentity>,
    ) -> Result<Option<E>, GuardError>
    where
        E: Lockable,
        T: RowLock<E> + ?Sized,
    {
        match expected {
            Some(expected) => {
                let current = Self::lock_for_update(tx, key).await?;
                Self::validate_identity(expected, &current.lock_identity())?;
                Ok(Some(current))
            }
            None => Ok(<T as RowLock<E>>::find_for_update(tx, key).await?),
        }
    }

    /// Compares two identities.
    pub fn validate_identity(
        expected: &LockIdentity,
        found: &LockIdentity,
    ) -> Result<(), GuardError> {
        if expected == found {
            Ok(())
        } else {
            Err(GuardError::Conflict {
                expected: expected.clone(),
                found: found.clone(),
            })
        }
    }

    /// Sorts items into global lock order.
    ///
    /// Every caller that locks more than one row in sequence must go through
    /// this so overlapping runs acquire locks in the same order.
    pub fn lock_order<T, K, F>(items: &mut [T], key: F)
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        items.sort_by_key(key);
    }
}
