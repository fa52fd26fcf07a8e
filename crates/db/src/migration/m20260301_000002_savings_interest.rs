//! Generated savings interest batches and their entries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SAVINGS_INTEREST_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS generated_savings_interest_entries, \
             generated_savings_interests CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const SAVINGS_INTEREST_SQL: &str = r"
CREATE TABLE generated_savings_interests (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    document_no VARCHAR(64) NOT NULL,
    last_computation_date DATE NOT NULL,
    new_computation_date DATE NOT NULL,
    computation_type VARCHAR(48) NOT NULL,
    params JSONB NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'printed', 'posted')),
    total_interest DECIMAL(20, 4) NOT NULL DEFAULT 0,
    total_tax DECIMAL(20, 4) NOT NULL DEFAULT 0,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    printed_by UUID,
    printed_at TIMESTAMPTZ,
    posted_by UUID,
    posted_at TIMESTAMPTZ,
    post_account_id UUID,
    check_voucher_number VARCHAR(64),
    entry_date DATE,
    CONSTRAINT chk_period CHECK (new_computation_date > last_computation_date),
    CONSTRAINT chk_printed_stamp CHECK (status = 'draft' OR printed_at IS NOT NULL),
    CONSTRAINT chk_posted_stamp CHECK (status <> 'posted' OR posted_at IS NOT NULL)
);

CREATE INDEX idx_generated_savings_interests_scope
    ON generated_savings_interests(organization_id, branch_id, created_at DESC);

CREATE TABLE generated_savings_interest_entries (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL REFERENCES generated_savings_interests(id) ON DELETE CASCADE,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    account_id UUID NOT NULL,
    member_profile_id UUID NOT NULL,
    member_type_id UUID,
    member_ledger_id UUID,
    ending_balance DECIMAL(20, 4) NOT NULL,
    base_amount DECIMAL(20, 4) NOT NULL,
    applied_rate DECIMAL(10, 4) NOT NULL,
    interest_amount DECIMAL(20, 4) NOT NULL,
    interest_tax DECIMAL(20, 4) NOT NULL DEFAULT 0,
    posted_at TIMESTAMPTZ,
    CONSTRAINT uq_generated_savings_interest_entries_pair
        UNIQUE (batch_id, account_id, member_profile_id)
);

CREATE INDEX idx_generated_savings_interest_entries_batch
    ON generated_savings_interest_entries(batch_id, account_id, member_profile_id);
";
