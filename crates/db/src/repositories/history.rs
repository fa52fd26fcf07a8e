//! Account history repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coopbank_core::StoreResult;
use coopbank_core::history::{AccountHistory, HistoryChangeType, HistoryReader};
use coopbank_shared::types::{AccountHistoryId, AccountId, BranchId, OrganizationId, Scope, UserId};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select, Set,
};

use crate::entities::account_histories;
use crate::error::{corrupt, json_error, store_error};

/// Reads the append-only configuration history.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    /// Creates a new history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn many(
        &self,
        select: Select<account_histories::Entity>,
    ) -> StoreResult<Vec<AccountHistory>> {
        select
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(from_model)
            .collect()
    }
}

fn in_scope(scope: Scope) -> Condition {
    Condition::all()
        .add(account_histories::Column::OrganizationId.eq(scope.organization_id.into_inner()))
        .add(account_histories::Column::BranchId.eq(scope.branch_id.into_inner()))
}

pub(crate) fn from_model(model: account_histories::Model) -> StoreResult<AccountHistory> {
    let change_type = HistoryChangeType::parse(&model.change_type)
        .ok_or_else(|| corrupt("history change type", &model.change_type))?;
    let snapshot = serde_json::from_value(model.snapshot).map_err(|e| json_error(&e))?;

    Ok(AccountHistory {
        id: AccountHistoryId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        scope: Scope::new(
            OrganizationId::from_uuid(model.organization_id),
            BranchId::from_uuid(model.branch_id),
        ),
        change_type,
        snapshot,
        valid_from: model.valid_from.with_timezone(&Utc),
        valid_to: model.valid_to.map(|at| at.with_timezone(&Utc)),
        recorded_by: UserId::from_uuid(model.recorded_by),
    })
}

pub(crate) fn to_active(history: &AccountHistory) -> StoreResult<account_histories::ActiveModel> {
    let snapshot = serde_json::to_value(&history.snapshot).map_err(|e| json_error(&e))?;

    Ok(account_histories::ActiveModel {
        id: Set(history.id.into_inner()),
        account_id: Set(history.account_id.into_inner()),
        organization_id: Set(history.scope.organization_id.into_inner()),
        branch_id: Set(history.scope.branch_id.into_inner()),
        change_type: Set(history.change_type.as_str().to_string()),
        snapshot: Set(snapshot),
        valid_from: Set(history.valid_from.into()),
        valid_to: Set(history.valid_to.map(Into::into)),
        recorded_by: Set(history.recorded_by.into_inner()),
    })
}

#[async_trait]
impl HistoryReader for HistoryRepository {
    async fn timeline(&self, account_id: AccountId) -> StoreResult<Vec<AccountHistory>> {
        let select = account_histories::Entity::find()
            .filter(account_histories::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(account_histories::Column::ValidFrom)
            .order_by_asc(account_histories::Column::Id);
        self.many(select).await
    }

    async fn containing(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AccountHistory>> {
        account_histories::Entity::find()
            .filter(account_histories::Column::AccountId.eq(account_id.into_inner()))
            .filter(account_histories::Column::ValidFrom.lte(at))
            .filter(
                Condition::any()
                    .add(account_histories::Column::ValidTo.is_null())
                    .add(account_histories::Column::ValidTo.gt(at)),
            )
            .order_by_desc(account_histories::Column::ValidFrom)
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(from_model)
            .transpose()
    }

    async fn latest_at_or_before(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<AccountHistory>> {
        account_histories::Entity::find()
            .filter(account_histories::Column::AccountId.eq(account_id.into_inner()))
            .filter(account_histories::Column::ValidFrom.lte(at))
            .order_by_desc(account_histories::Column::ValidFrom)
            .order_by_desc(account_histories::Column::Id)
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(from_model)
            .transpose()
    }

    async fn changed_in_range(
        &self,
        scope: Scope,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountHistory>> {
        let select = account_histories::Entity::find()
            .filter(in_scope(scope))
            .filter(account_histories::Column::ValidFrom.gte(start))
            .filter(account_histories::Column::ValidFrom.lt(end))
            .order_by_asc(account_histories::Column::ValidFrom)
            .order_by_asc(account_histories::Column::Id);
        self.many(select).await
    }

    async fn scope_timeline(
        &self,
        scope: Scope,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<AccountHistory>> {
        let select = account_histories::Entity::find()
            .filter(in_scope(scope))
            .filter(account_histories::Column::ValidFrom.lte(until))
            .order_by_asc(account_histories::Column::ValidFrom)
            .order_by_asc(account_histories::Column::Id);
        self.many(select).await
    }
}
