//! Account configuration repository.
//!
//! The full configuration is stored as JSONB next to the columns that are
//! filtered on (scope, name, type, soft-delete stamps).

use async_trait::async_trait;
use chrono::Utc;
use coopbank_core::StoreResult;
use coopbank_core::account::{AccountRecord, AccountStore, AccountUnit, Deletion};
use coopbank_core::guard::RowLock;
use coopbank_core::history::{AccountHistory, HistoryWrite};
use coopbank_core::store::StoreError;
use coopbank_shared::types::{AccountId, Scope, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::history;
use crate::entities::{account_configurations, account_histories};
use crate::error::{json_error, store_error};

/// Account configuration repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// One account mutation transaction.
pub struct AccountTxn {
    txn: DatabaseTransaction,
}

fn from_model(model: account_configurations::Model) -> StoreResult<AccountRecord> {
    let configuration = serde_json::from_value(model.configuration).map_err(|e| json_error(&e))?;
    let deleted = match (model.deleted_by, model.deleted_at) {
        (Some(by), Some(at)) => Some(Deletion {
            deleted_by: UserId::from_uuid(by),
            deleted_at: at.with_timezone(&Utc),
        }),
        _ => None,
    };

    Ok(AccountRecord {
        configuration,
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at.with_timezone(&Utc),
        updated_by: UserId::from_uuid(model.updated_by),
        updated_at: model.updated_at.with_timezone(&Utc),
        deleted,
    })
}

fn to_active(record: &AccountRecord) -> StoreResult<account_configurations::ActiveModel> {
    let config = &record.configuration;
    let json = serde_json::to_value(config).map_err(|e| json_error(&e))?;

    Ok(account_configurations::ActiveModel {
        id: Set(config.account_id.into_inner()),
        organization_id: Set(config.scope.organization_id.into_inner()),
        branch_id: Set(config.scope.branch_id.into_inner()),
        name: Set(config.name.clone()),
        account_type: Set(config.account_type.as_str().to_string()),
        configuration: Set(json),
        created_by: Set(record.created_by.into_inner()),
        created_at: Set(record.created_at.into()),
        updated_by: Set(record.updated_by.into_inner()),
        updated_at: Set(record.updated_at.into()),
        deleted_by: Set(record.deleted.map(|d| d.deleted_by.into_inner())),
        deleted_at: Set(record.deleted.map(|d| d.deleted_at.into())),
    })
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn begin(&self) -> StoreResult<Box<dyn AccountUnit>> {
        let txn = self.db.begin().await.map_err(store_error)?;
        Ok(Box::new(AccountTxn { txn }))
    }

    async fn find(&self, account_id: AccountId) -> StoreResult<Option<AccountRecord>> {
        account_configurations::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(from_model)
            .transpose()
    }

    async fn list(&self, scope: Scope) -> StoreResult<Vec<AccountRecord>> {
        account_configurations::Entity::find()
            .filter(
                account_configurations::Column::OrganizationId
                    .eq(scope.organization_id.into_inner()),
            )
            .filter(account_configurations::Column::BranchId.eq(scope.branch_id.into_inner()))
            .filter(account_configurations::Column::DeletedAt.is_null())
            .order_by_asc(account_configurations::Column::Name)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(from_model)
            .collect()
    }
}

#[async_trait]
impl RowLock<AccountRecord> for AccountTxn {
    async fn find_for_update(&mut self, key: &AccountId) -> StoreResult<Option<AccountRecord>> {
        account_configurations::Entity::find_by_id(key.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(from_model)
            .transpose()
    }
}

#[async_trait]
impl AccountUnit for AccountTxn {
    async fn name_taken(
        &mut self,
        scope: Scope,
        name: &str,
        excluding: Option<AccountId>,
    ) -> StoreResult<bool> {
        let mut query = account_configurations::Entity::find()
            .filter(
                account_configurations::Column::OrganizationId
                    .eq(scope.organization_id.into_inner()),
            )
            .filter(account_configurations::Column::BranchId.eq(scope.branch_id.into_inner()))
            .filter(account_configurations::Column::Name.eq(name))
            .filter(account_configurations::Column::DeletedAt.is_null());
        if let Some(id) = excluding {
            query = query.filter(account_configurations::Column::Id.ne(id.into_inner()));
        }

        let count = query.count(&self.txn).await.map_err(store_error)?;
        Ok(count > 0)
    }

    async fn insert(&mut self, record: &AccountRecord) -> StoreResult<()> {
        to_active(record)?.insert(&self.txn).await.map_err(store_error)?;
        Ok(())
    }

    async fn update(&mut self, record: &AccountRecord) -> StoreResult<()> {
        to_active(record)?.update(&self.txn).await.map_err(store_error)?;
        Ok(())
    }

    async fn open_history(&mut self, account_id: AccountId) -> StoreResult<Option<AccountHistory>> {
        account_histories::Entity::find()
            .filter(account_histories::Column::AccountId.eq(account_id.into_inner()))
            .filter(account_histories::Column::ValidTo.is_null())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(history::from_model)
            .transpose()
    }

    async fn apply_history(&mut self, write: &HistoryWrite) -> StoreResult<()> {
        if let Some(close) = write.close {
            let result = account_histories::Entity::update_many()
                .col_expr(account_histories::Column::ValidTo, Expr::value(close.valid_to))
                .filter(account_histories::Column::Id.eq(close.history_id.into_inner()))
                .filter(account_histories::Column::ValidTo.is_null())
                .exec(&self.txn)
                .await
                .map_err(store_error)?;
            if result.rows_affected != 1 {
                return Err(StoreError::NotFound(format!(
                    "open history row {}",
                    close.history_id
                )));
            }
        }

        history::to_active(&write.append)?
            .insert(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().await.map_err(store_error)
    }
}
