//! Organization/branch scoping.
//!
//! Every persisted entity lives inside exactly one organization and branch.

use serde::{Deserialize, Serialize};

use super::id::{BranchId, OrganizationId};

/// The organization and branch an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
}

impl Scope {
    /// Creates a scope.
    #[must_use]
    pub const fn new(organization_id: OrganizationId, branch_id: BranchId) -> Self {
        Self {
            organization_id,
            branch_id,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.branch_id)
    }
}
