//! Member type change history read by year and date interest tiers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(MEMBER_TYPE_HISTORIES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS member_type_histories CASCADE;")
            .await?;
        Ok(())
    }
}

const MEMBER_TYPE_HISTORIES_SQL: &str = r"
-- One row each time a member is given a member type
CREATE TABLE member_type_histories (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    branch_id UUID NOT NULL,
    member_profile_id UUID NOT NULL REFERENCES member_profiles(id) ON DELETE CASCADE,
    member_type_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_member_type_histories_member
    ON member_type_histories(member_profile_id, member_type_id, created_at DESC);
";
