//! `SeaORM` Entity for account_histories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "account_histories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub change_type: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub snapshot: Json,
    pub valid_from: DateTimeWithTimeZone,
    pub valid_to: Option<DateTimeWithTimeZone>,
    pub recorded_by: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_configurations::Entity",
        from = "Column::AccountId",
        to = "super::account_configurations::Column::Id"
    )]
    AccountConfigurations,
}

impl Related<super::account_configurations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountConfigurations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
