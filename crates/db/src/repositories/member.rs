//! Member type history repository.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use coopbank_core::StoreResult;
use coopbank_core::savings::MemberTypeHistorySource;
use coopbank_shared::types::{MemberProfileId, MemberTypeId, Scope};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::member_type_histories;
use crate::error::store_error;

/// Reads member type changes.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
}

impl MemberRepository {
    /// Creates a new member repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MemberTypeHistorySource for MemberRepository {
    async fn member_type_since(
        &self,
        scope: Scope,
        member_profile_id: MemberProfileId,
        member_type_id: MemberTypeId,
    ) -> StoreResult<Option<NaiveDate>> {
        let latest = member_type_histories::Entity::find()
            .filter(
                member_type_histories::Column::MemberProfileId.eq(member_profile_id.into_inner()),
            )
            .filter(member_type_histories::Column::MemberTypeId.eq(member_type_id.into_inner()))
            .filter(
                member_type_histories::Column::OrganizationId
                    .eq(scope.organization_id.into_inner()),
            )
            .filter(member_type_histories::Column::BranchId.eq(scope.branch_id.into_inner()))
            .order_by_desc(member_type_histories::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(store_error)?;

        Ok(latest.map(|row| row.created_at.with_timezone(&Utc).date_naive()))
    }
}
