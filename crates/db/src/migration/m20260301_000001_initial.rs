//! Initial schema: account configurations, their history, members and ledgers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS general_ledger_entries, member_accounting_ledgers, \
             member_profiles, account_histories, account_configurations CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Current account configuration; the full value object lives in `configuration`
CREATE TABLE account_configurations (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type VARCHAR(32) NOT NULL,
    configuration JSONB NOT NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_by UUID NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_by UUID,
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_deleted_pair CHECK ((deleted_by IS NULL) = (deleted_at IS NULL))
);

-- Names are unique among live accounts of a branch; deleted names may be reused
CREATE UNIQUE INDEX uq_account_configurations_name
    ON account_configurations(organization_id, branch_id, name)
    WHERE deleted_at IS NULL;

CREATE INDEX idx_account_configurations_scope
    ON account_configurations(organization_id, branch_id, account_type);

-- Append-only configuration snapshots with validity intervals [valid_from, valid_to)
CREATE TABLE account_histories (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES account_configurations(id),
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    change_type VARCHAR(16) NOT NULL CHECK (change_type IN ('created', 'updated', 'deleted')),
    snapshot JSONB NOT NULL,
    valid_from TIMESTAMPTZ NOT NULL,
    valid_to TIMESTAMPTZ,
    recorded_by UUID NOT NULL,
    CONSTRAINT chk_valid_interval CHECK (valid_to IS NULL OR valid_to >= valid_from)
);

-- At most one open row per account
CREATE UNIQUE INDEX uq_account_histories_open
    ON account_histories(account_id)
    WHERE valid_to IS NULL;

CREATE INDEX idx_account_histories_account ON account_histories(account_id, valid_from);
CREATE INDEX idx_account_histories_scope ON account_histories(organization_id, branch_id, valid_from);

CREATE TABLE member_profiles (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    member_type_id UUID,
    full_name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- One running aggregate per (member, account)
CREATE TABLE member_accounting_ledgers (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    account_id UUID NOT NULL REFERENCES account_configurations(id),
    member_profile_id UUID NOT NULL REFERENCES member_profiles(id),
    balance DECIMAL(20, 4) NOT NULL DEFAULT 0,
    interest DECIMAL(20, 4) NOT NULL DEFAULT 0,
    fines DECIMAL(20, 4) NOT NULL DEFAULT 0,
    due DECIMAL(20, 4) NOT NULL DEFAULT 0,
    carried_forward_due DECIMAL(20, 4) NOT NULL DEFAULT 0,
    stored_value_facility DECIMAL(20, 4) NOT NULL DEFAULT 0,
    principal_due DECIMAL(20, 4) NOT NULL DEFAULT 0,
    count BIGINT NOT NULL DEFAULT 0,
    last_pay TIMESTAMPTZ,
    closed_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_member_accounting_ledgers_key
        UNIQUE (account_id, member_profile_id, organization_id, branch_id)
);

CREATE TABLE general_ledger_entries (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    account_id UUID NOT NULL,
    member_profile_id UUID,
    entry_date DATE NOT NULL,
    source VARCHAR(32) NOT NULL,
    reference_id UUID NOT NULL,
    check_voucher_number VARCHAR(64),
    debit DECIMAL(20, 4) NOT NULL DEFAULT 0,
    credit DECIMAL(20, 4) NOT NULL DEFAULT 0,
    memo TEXT NOT NULL DEFAULT '',
    posted_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_one_sided CHECK ((debit = 0) <> (credit = 0)),
    CONSTRAINT chk_non_negative CHECK (debit >= 0 AND credit >= 0)
);

-- Balance reconstruction reads one member's movements in date order
CREATE INDEX idx_general_ledger_entries_member
    ON general_ledger_entries(account_id, member_profile_id, entry_date, created_at);
CREATE INDEX idx_general_ledger_entries_reference ON general_ledger_entries(reference_id);
";
