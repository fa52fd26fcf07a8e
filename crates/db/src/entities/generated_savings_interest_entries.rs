//! `SeaORM` Entity for generated_savings_interest_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "generated_savings_interest_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Uuid,
    pub member_type_id: Option<Uuid>,
    pub member_ledger_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub ending_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub base_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub applied_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub interest_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub interest_tax: Decimal,
    pub posted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::generated_savings_interests::Entity",
        from = "Column::BatchId",
        to = "super::generated_savings_interests::Column::Id",
        on_delete = "Cascade"
    )]
    GeneratedSavingsInterests,
}

impl Related<super::generated_savings_interests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneratedSavingsInterests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
