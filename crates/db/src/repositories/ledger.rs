//! General-ledger and member ledger repository.
//!
//! Reads ledger movements for balance reconstruction and opens the per-pair
//! posting transactions used by the savings interest post run.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use coopbank_core::StoreResult;
use coopbank_core::account::AccountConfiguration;
use coopbank_core::balance::{LedgerDelta, LedgerDeltaSource};
use coopbank_core::guard::RowLock;
use coopbank_core::ledger::{JournalPosting, LedgerKey, MemberLedger, NormalBalance};
use coopbank_core::savings::{PostingStore, PostingUnit};
use coopbank_core::store::StoreError;
use coopbank_shared::types::{
    AccountId, BranchId, GeneralLedgerEntryId, MemberLedgerId, MemberProfileId, OrganizationId,
    SavingsInterestEntryId, Scope,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    account_configurations, general_ledger_entries, generated_savings_interest_entries,
    member_accounting_ledgers,
};
use crate::error::{json_error, store_error};

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolves how movements on an account change its balance.
    async fn normal_balance(&self, account_id: AccountId) -> StoreResult<NormalBalance> {
        let model = account_configurations::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")))?;
        let config: AccountConfiguration =
            serde_json::from_value(model.configuration).map_err(|e| json_error(&e))?;
        Ok(NormalBalance::for_gl_type(config.general_ledger_type))
    }

    /// Finds the member ledger of a pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_ledger(&self, key: &LedgerKey) -> StoreResult<Option<MemberLedger>> {
        member_accounting_ledgers::Entity::find()
            .filter(ledger_key(key))
            .one(&self.db)
            .await
            .map_err(store_error)
            .map(|found| found.map(ledger_from_model))
    }

    /// Lists the general-ledger lines posted for a reference (a batch id).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_reference(
        &self,
        reference_id: Uuid,
    ) -> StoreResult<Vec<general_ledger_entries::Model>> {
        general_ledger_entries::Entity::find()
            .filter(general_ledger_entries::Column::ReferenceId.eq(reference_id))
            .order_by_asc(general_ledger_entries::Column::CreatedAt)
            .order_by_asc(general_ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)
    }
}

fn ledger_key(key: &LedgerKey) -> Condition {
    Condition::all()
        .add(member_accounting_ledgers::Column::AccountId.eq(key.account_id.into_inner()))
        .add(
            member_accounting_ledgers::Column::MemberProfileId
                .eq(key.member_profile_id.into_inner()),
        )
        .add(
            member_accounting_ledgers::Column::OrganizationId
                .eq(key.scope.organization_id.into_inner()),
        )
        .add(member_accounting_ledgers::Column::BranchId.eq(key.scope.branch_id.into_inner()))
}

fn member_lines(key: &LedgerKey) -> Condition {
    Condition::all()
        .add(general_ledger_entries::Column::AccountId.eq(key.account_id.into_inner()))
        .add(
            general_ledger_entries::Column::MemberProfileId.eq(key.member_profile_id.into_inner()),
        )
        .add(
            general_ledger_entries::Column::OrganizationId
                .eq(key.scope.organization_id.into_inner()),
        )
        .add(general_ledger_entries::Column::BranchId.eq(key.scope.branch_id.into_inner()))
}

pub(crate) fn ledger_from_model(model: member_accounting_ledgers::Model) -> MemberLedger {
    MemberLedger {
        id: MemberLedgerId::from_uuid(model.id),
        key: LedgerKey::new(
            Scope::new(
                OrganizationId::from_uuid(model.organization_id),
                BranchId::from_uuid(model.branch_id),
            ),
            AccountId::from_uuid(model.account_id),
            MemberProfileId::from_uuid(model.member_profile_id),
        ),
        balance: model.balance,
        interest: model.interest,
        fines: model.fines,
        due: model.due,
        carried_forward_due: model.carried_forward_due,
        stored_value_facility: model.stored_value_facility,
        principal_due: model.principal_due,
        count: model.count,
        last_pay: model.last_pay.map(|at| at.with_timezone(&Utc)),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn ledger_to_active(ledger: &MemberLedger) -> member_accounting_ledgers::ActiveModel {
    member_accounting_ledgers::ActiveModel {
        id: Set(ledger.id.into_inner()),
        organization_id: Set(ledger.key.scope.organization_id.into_inner()),
        branch_id: Set(ledger.key.scope.branch_id.into_inner()),
        account_id: Set(ledger.key.account_id.into_inner()),
        member_profile_id: Set(ledger.key.member_profile_id.into_inner()),
        balance: Set(ledger.balance),
        interest: Set(ledger.interest),
        fines: Set(ledger.fines),
        due: Set(ledger.due),
        carried_forward_due: Set(ledger.carried_forward_due),
        stored_value_facility: Set(ledger.stored_value_facility),
        principal_due: Set(ledger.principal_due),
        count: Set(ledger.count),
        last_pay: Set(ledger.last_pay.map(Into::into)),
        closed_at: Set(None),
        updated_at: Set(ledger.updated_at.into()),
    }
}

#[async_trait]
impl LedgerDeltaSource for LedgerRepository {
    async fn opening_balance(&self, key: &LedgerKey, before: NaiveDate) -> StoreResult<Decimal> {
        let normal = self.normal_balance(key.account_id).await?;
        let sums: Option<(Option<Decimal>, Option<Decimal>)> =
            general_ledger_entries::Entity::find()
                .select_only()
                .column_as(Expr::col(general_ledger_entries::Column::Debit).sum(), "debit")
                .column_as(Expr::col(general_ledger_entries::Column::Credit).sum(), "credit")
                .filter(member_lines(key))
                .filter(general_ledger_entries::Column::EntryDate.lt(before))
                .into_tuple()
                .one(&self.db)
                .await
                .map_err(store_error)?;

        let (debit, credit) = sums.unwrap_or((None, None));
        Ok(normal.balance_change(
            debit.unwrap_or(Decimal::ZERO),
            credit.unwrap_or(Decimal::ZERO),
        ))
    }

    async fn fetch_deltas(
        &self,
        key: &LedgerKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LedgerDelta>> {
        let normal = self.normal_balance(key.account_id).await?;
        let rows = general_ledger_entries::Entity::find()
            .filter(member_lines(key))
            .filter(general_ledger_entries::Column::EntryDate.gte(from))
            .filter(general_ledger_entries::Column::EntryDate.lt(to))
            .order_by_asc(general_ledger_entries::Column::EntryDate)
            .order_by_asc(general_ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        tracing::debug!(pair = %key, count = rows.len(), "Fetched ledger deltas");

        Ok(rows
            .into_iter()
            .map(|row| LedgerDelta {
                entry_date: row.entry_date,
                amount: normal.balance_change(row.debit, row.credit),
                recorded_at: row.created_at.with_timezone(&Utc),
            })
            .collect())
    }
}

#[async_trait]
impl PostingStore for LedgerRepository {
    async fn begin(&self) -> StoreResult<Box<dyn PostingUnit>> {
        let txn = self.db.begin().await.map_err(store_error)?;
        Ok(Box::new(PostingTxn { txn }))
    }
}

/// One pair's posting transaction.
pub struct PostingTxn {
    txn: DatabaseTransaction,
}

#[async_trait]
impl RowLock<MemberLedger> for PostingTxn {
    async fn find_for_update(&mut self, key: &LedgerKey) -> StoreResult<Option<MemberLedger>> {
        member_accounting_ledgers::Entity::find()
            .filter(ledger_key(key))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)
            .map(|found| found.map(ledger_from_model))
    }
}

#[async_trait]
impl PostingUnit for PostingTxn {
    async fn claim_entry(
        &mut self,
        entry_id: SavingsInterestEntryId,
        posted_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = generated_savings_interest_entries::Entity::update_many()
            .col_expr(
                generated_savings_interest_entries::Column::PostedAt,
                Expr::value(posted_at),
            )
            .filter(generated_savings_interest_entries::Column::Id.eq(entry_id.into_inner()))
            .filter(generated_savings_interest_entries::Column::PostedAt.is_null())
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected == 1)
    }

    async fn save_ledger(&mut self, ledger: &MemberLedger) -> StoreResult<()> {
        use member_accounting_ledgers::Column;

        member_accounting_ledgers::Entity::insert(ledger_to_active(ledger))
            .on_conflict(
                OnConflict::columns([
                    Column::AccountId,
                    Column::MemberProfileId,
                    Column::OrganizationId,
                    Column::BranchId,
                ])
                .update_columns([
                    Column::Balance,
                    Column::Interest,
                    Column::Fines,
                    Column::Due,
                    Column::CarriedForwardDue,
                    Column::StoredValueFacility,
                    Column::PrincipalDue,
                    Column::Count,
                    Column::LastPay,
                    Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn append_posting(&mut self, posting: &JournalPosting) -> StoreResult<()> {
        let now = Utc::now();
        let rows = posting.lines.iter().map(|line| {
            let (debit, credit) = line.columns();
            general_ledger_entries::ActiveModel {
                id: Set(GeneralLedgerEntryId::new().into_inner()),
                organization_id: Set(posting.scope.organization_id.into_inner()),
                branch_id: Set(posting.scope.branch_id.into_inner()),
                account_id: Set(line.account_id.into_inner()),
                member_profile_id: Set(line.member_profile_id.map(MemberProfileId::into_inner)),
                entry_date: Set(posting.entry_date),
                source: Set(posting.source.as_str().to_string()),
                reference_id: Set(posting.reference_id),
                check_voucher_number: Set(posting.check_voucher_number.clone()),
                debit: Set(debit),
                credit: Set(credit),
                memo: Set(line.memo.clone()),
                posted_by: Set(posting.posted_by.into_inner()),
                created_at: Set(now.into()),
            }
        });

        general_ledger_entries::Entity::insert_many(rows)
            .exec(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().await.map_err(store_error)
    }
}
