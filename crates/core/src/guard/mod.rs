//! Row-level locking and optimistic-conflict detection.
//!
//! - `lock` - `RowLock` collaborator trait and `ConcurrencyGuard`
//! - `error` - guard error types

pub mod error;
pub mod lock;

pub use error::GuardError;
pub use lock::{ConcurrencyGuard, LockIdentity, Lockable, RowLock};
