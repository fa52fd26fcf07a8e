//! Acting user context for audit attribution.

use coopbank_shared::types::{Scope, UserId};

/// The user performing an operation and the scope they operate in.
///
/// Supplies `created_by`, `updated_by`, `printed_by` and `posted_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    /// Acting user.
    pub user_id: UserId,
    /// Organization and branch the user is working in.
    pub scope: Scope,
}

impl ActorContext {
    /// Creates an actor context.
    #[must_use]
    pub const fn new(user_id: UserId, scope: Scope) -> Self {
        Self { user_id, scope }
    }
}
