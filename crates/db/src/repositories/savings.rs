//! Savings interest batch repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coopbank_core::StoreResult;
use coopbank_core::account::AccountType;
use coopbank_core::ledger::LedgerKey;
use coopbank_core::savings::{
    BatchAction, BatchFilter, BatchStatus, BatchStore, BatchTotals, EligibilitySource,
    EligiblePair, PostStamp, PrintStamp, SavingsInterestBatch, SavingsInterestEntry,
};
use coopbank_shared::types::{
    AccountId, BranchId, MemberLedgerId, MemberProfileId, MemberTypeId, OrganizationId,
    SavingsInterestBatchId, SavingsInterestEntryId, Scope, UserId,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    account_configurations, generated_savings_interest_entries as entries,
    generated_savings_interests as batches, member_accounting_ledgers, member_profiles,
};
use crate::error::{corrupt, json_error, store_error};

/// Savings interest batch repository.
#[derive(Debug, Clone)]
pub struct SavingsBatchRepository {
    db: DatabaseConnection,
}

impl SavingsBatchRepository {
    /// Creates a new savings batch repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_entries(
        txn: &DatabaseTransaction,
        batch: &batches::Model,
        list: &[SavingsInterestEntry],
    ) -> StoreResult<()> {
        if list.is_empty() {
            return Ok(());
        }
        let rows = list.iter().map(|entry| entry_to_active(batch, entry));
        entries::Entity::insert_many(rows)
            .exec(txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

fn entry_to_active(batch: &batches::Model, entry: &SavingsInterestEntry) -> entries::ActiveModel {
    entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        batch_id: Set(batch.id),
        organization_id: Set(batch.organization_id),
        branch_id: Set(batch.branch_id),
        account_id: Set(entry.key.account_id.into_inner()),
        member_profile_id: Set(entry.key.member_profile_id.into_inner()),
        member_type_id: Set(entry.member_type_id.map(MemberTypeId::into_inner)),
        member_ledger_id: Set(entry.ledger_id.map(MemberLedgerId::into_inner)),
        ending_balance: Set(entry.ending_balance),
        base_amount: Set(entry.base_amount),
        applied_rate: Set(entry.applied_rate),
        interest_amount: Set(entry.interest_amount),
        interest_tax: Set(entry.interest_tax),
        posted_at: Set(entry.posted_at.map(Into::into)),
    }
}

fn entry_from_model(model: entries::Model) -> SavingsInterestEntry {
    SavingsInterestEntry {
        id: SavingsInterestEntryId::from_uuid(model.id),
        batch_id: SavingsInterestBatchId::from_uuid(model.batch_id),
        key: LedgerKey::new(
            Scope::new(
                OrganizationId::from_uuid(model.organization_id),
                BranchId::from_uuid(model.branch_id),
            ),
            AccountId::from_uuid(model.account_id),
            MemberProfileId::from_uuid(model.member_profile_id),
        ),
        member_type_id: model.member_type_id.map(MemberTypeId::from_uuid),
        ledger_id: model.member_ledger_id.map(MemberLedgerId::from_uuid),
        ending_balance: model.ending_balance,
        base_amount: model.base_amount,
        applied_rate: model.applied_rate,
        interest_amount: model.interest_amount,
        interest_tax: model.interest_tax,
        posted_at: model.posted_at.map(|at| at.with_timezone(&Utc)),
    }
}

fn batch_to_active(batch: &SavingsInterestBatch) -> StoreResult<batches::ActiveModel> {
    let params = serde_json::to_value(&batch.params).map_err(|e| json_error(&e))?;
    let posted = batch.posted.as_ref();

    Ok(batches::ActiveModel {
        id: Set(batch.id.into_inner()),
        organization_id: Set(batch.scope.organization_id.into_inner()),
        branch_id: Set(batch.scope.branch_id.into_inner()),
        document_no: Set(batch.params.document_no.clone()),
        last_computation_date: Set(batch.params.last_computation_date),
        new_computation_date: Set(batch.params.new_computation_date),
        computation_type: Set(batch.params.computation_type.as_str().to_string()),
        params: Set(params),
        status: Set(batch.status.as_str().to_string()),
        total_interest: Set(batch.total_interest),
        total_tax: Set(batch.total_tax),
        created_by: Set(batch.created_by.into_inner()),
        created_at: Set(batch.created_at.into()),
        updated_at: Set(batch.updated_at.into()),
        printed_by: Set(batch.printed.map(|p| p.printed_by.into_inner())),
        printed_at: Set(batch.printed.map(|p| p.printed_at.into())),
        posted_by: Set(posted.map(|p| p.posted_by.into_inner())),
        posted_at: Set(posted.map(|p| p.posted_at.into())),
        post_account_id: Set(posted.map(|p| p.post_account_id.into_inner())),
        check_voucher_number: Set(posted.and_then(|p| p.check_voucher_number.clone())),
        entry_date: Set(posted.map(|p| p.entry_date)),
    })
}

fn batch_from_model(
    model: batches::Model,
    entry_models: Vec<entries::Model>,
) -> StoreResult<SavingsInterestBatch> {
    let status = BatchStatus::parse(&model.status)
        .ok_or_else(|| corrupt("batch status", &model.status))?;
    let params = serde_json::from_value(model.params).map_err(|e| json_error(&e))?;

    let printed = match (model.printed_by, model.printed_at) {
        (Some(by), Some(at)) => Some(PrintStamp {
            printed_by: UserId::from_uuid(by),
            printed_at: at.with_timezone(&Utc),
        }),
        _ => None,
    };
    let posted = match (
        model.posted_by,
        model.posted_at,
        model.post_account_id,
        model.entry_date,
    ) {
        (Some(by), Some(at), Some(account), Some(entry_date)) => Some(PostStamp {
            posted_by: UserId::from_uuid(by),
            posted_at: at.with_timezone(&Utc),
            post_account_id: AccountId::from_uuid(account),
            check_voucher_number: model.check_voucher_number,
            entry_date,
        }),
        _ => None,
    };

    let mut entries: Vec<SavingsInterestEntry> =
        entry_models.into_iter().map(entry_from_model).collect();
    entries.sort_by_key(|entry| entry.key);

    Ok(SavingsInterestBatch {
        id: SavingsInterestBatchId::from_uuid(model.id),
        scope: Scope::new(
            OrganizationId::from_uuid(model.organization_id),
            BranchId::from_uuid(model.branch_id),
        ),
        params,
        status,
        total_interest: model.total_interest,
        total_tax: model.total_tax,
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        printed,
        posted,
        entries,
    })
}

#[async_trait]
impl BatchStore for SavingsBatchRepository {
    async fn insert(&self, batch: &SavingsInterestBatch) -> StoreResult<()> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let header = batch_to_active(batch)?.insert(&txn).await.map_err(store_error)?;
        Self::insert_entries(&txn, &header, &batch.entries).await?;

        txn.commit().await.map_err(store_error)?;
        tracing::info!(
            batch_id = %batch.id,
            entries = batch.entries.len(),
            "Stored savings interest batch"
        );
        Ok(())
    }

    async fn find(&self, id: SavingsInterestBatchId) -> StoreResult<Option<SavingsInterestBatch>> {
        let Some(header) = batches::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let entry_models = entries::Entity::find()
            .filter(entries::Column::BatchId.eq(header.id))
            .order_by_asc(entries::Column::AccountId)
            .order_by_asc(entries::Column::MemberProfileId)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        batch_from_model(header, entry_models).map(Some)
    }

    async fn replace_entries(
        &self,
        id: SavingsInterestBatchId,
        list: &[SavingsInterestEntry],
        totals: BatchTotals,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let txn = self.db.begin().await.map_err(store_error)?;

        let Some(header) = batches::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_error)?
        else {
            return Ok(false);
        };
        if header.status != BatchStatus::Draft.as_str() {
            return Ok(false);
        }

        entries::Entity::delete_many()
            .filter(entries::Column::BatchId.eq(header.id))
            .exec(&txn)
            .await
            .map_err(store_error)?;
        Self::insert_entries(&txn, &header, list).await?;

        let mut active: batches::ActiveModel = header.into();
        active.total_interest = Set(totals.total_interest);
        active.total_tax = Set(totals.total_tax);
        active.updated_at = Set(updated_at.into());
        active.update(&txn).await.map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        Ok(true)
    }

    async fn transition(
        &self,
        id: SavingsInterestBatchId,
        from: BatchStatus,
        action: &BatchAction,
    ) -> StoreResult<bool> {
        let update = batches::Entity::update_many()
            .col_expr(batches::Column::Status, Expr::value(action.new_status().as_str()));
        let update = match action {
            BatchAction::Print { stamp, .. } => update
                .col_expr(batches::Column::PrintedBy, Expr::value(stamp.printed_by.into_inner()))
                .col_expr(batches::Column::PrintedAt, Expr::value(stamp.printed_at))
                .col_expr(batches::Column::UpdatedAt, Expr::value(stamp.printed_at)),
            BatchAction::Post { stamp, .. } => update
                .col_expr(batches::Column::PostedBy, Expr::value(stamp.posted_by.into_inner()))
                .col_expr(batches::Column::PostedAt, Expr::value(stamp.posted_at))
                .col_expr(
                    batches::Column::PostAccountId,
                    Expr::value(stamp.post_account_id.into_inner()),
                )
                .col_expr(
                    batches::Column::CheckVoucherNumber,
                    Expr::value(stamp.check_voucher_number.clone()),
                )
                .col_expr(batches::Column::EntryDate, Expr::value(stamp.entry_date))
                .col_expr(batches::Column::UpdatedAt, Expr::value(stamp.posted_at)),
        };

        let result = update
            .filter(batches::Column::Id.eq(id.into_inner()))
            .filter(batches::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected == 1)
    }
}

#[async_trait]
impl EligibilitySource for SavingsBatchRepository {
    async fn eligible_pairs(
        &self,
        scope: Scope,
        filter: &BatchFilter,
    ) -> StoreResult<Vec<EligiblePair>> {
        let mut accounts = account_configurations::Entity::find()
            .select_only()
            .column(account_configurations::Column::Id)
            .filter(
                account_configurations::Column::OrganizationId
                    .eq(scope.organization_id.into_inner()),
            )
            .filter(account_configurations::Column::BranchId.eq(scope.branch_id.into_inner()))
            .filter(account_configurations::Column::AccountType.eq(AccountType::Deposit.as_str()))
            .filter(account_configurations::Column::DeletedAt.is_null());
        if let Some(account_id) = filter.account_id {
            accounts =
                accounts.filter(account_configurations::Column::Id.eq(account_id.into_inner()));
        }
        let account_ids: Vec<Uuid> = accounts
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(store_error)?;

        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = member_accounting_ledgers::Entity::find()
            .filter(member_accounting_ledgers::Column::AccountId.is_in(account_ids))
            .filter(
                member_accounting_ledgers::Column::OrganizationId
                    .eq(scope.organization_id.into_inner()),
            )
            .filter(member_accounting_ledgers::Column::BranchId.eq(scope.branch_id.into_inner()))
            .order_by_asc(member_accounting_ledgers::Column::AccountId)
            .order_by_asc(member_accounting_ledgers::Column::MemberProfileId)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        let member_ids: Vec<Uuid> = rows.iter().map(|row| row.member_profile_id).collect();
        let member_types: HashMap<Uuid, Option<Uuid>> = if member_ids.is_empty() {
            HashMap::new()
        } else {
            member_profiles::Entity::find()
                .filter(member_profiles::Column::Id.is_in(member_ids))
                .all(&self.db)
                .await
                .map_err(store_error)?
                .into_iter()
                .map(|profile| (profile.id, profile.member_type_id))
                .collect()
        };

        let pairs: Vec<EligiblePair> = rows
            .into_iter()
            .map(|row| EligiblePair {
                key: LedgerKey::new(
                    scope,
                    AccountId::from_uuid(row.account_id),
                    MemberProfileId::from_uuid(row.member_profile_id),
                ),
                member_type_id: member_types
                    .get(&row.member_profile_id)
                    .copied()
                    .flatten()
                    .map(MemberTypeId::from_uuid),
                ledger_id: Some(MemberLedgerId::from_uuid(row.id)),
                closed: row.closed_at.is_some(),
            })
            .filter(|pair| filter.admits(pair))
            .collect();

        tracing::debug!(%scope, count = pairs.len(), "Listed eligible savings pairs");
        Ok(pairs)
    }
}
