//! `SeaORM` Entity for generated_savings_interests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "generated_savings_interests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub document_no: String,
    pub last_computation_date: Date,
    pub new_computation_date: Date,
    pub computation_type: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub params: Json,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub total_interest: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub total_tax: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub printed_by: Option<Uuid>,
    pub printed_at: Option<DateTimeWithTimeZone>,
    pub posted_by: Option<Uuid>,
    pub posted_at: Option<DateTimeWithTimeZone>,
    pub post_account_id: Option<Uuid>,
    pub check_voucher_number: Option<String>,
    pub entry_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::generated_savings_interest_entries::Entity")]
    GeneratedSavingsInterestEntries,
}

impl Related<super::generated_savings_interest_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GeneratedSavingsInterestEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
