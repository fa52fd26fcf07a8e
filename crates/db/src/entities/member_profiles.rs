//! `SeaORM` Entity for member_profiles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "member_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub member_type_id: Option<Uuid>,
    pub full_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::member_accounting_ledgers::Entity")]
    MemberAccountingLedgers,
}

impl Related<super::member_accounting_ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberAccountingLedgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
