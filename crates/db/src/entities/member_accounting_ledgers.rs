//! `SeaORM` Entity for member_accounting_ledgers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "member_accounting_ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub account_id: Uuid,
    pub member_profile_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub interest: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub fines: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub carried_forward_due: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub stored_value_facility: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 4)))")]
    pub principal_due: Decimal,
    pub count: i64,
    pub last_pay: Option<DateTimeWithTimeZone>,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member_profiles::Entity",
        from = "Column::MemberProfileId",
        to = "super::member_profiles::Column::Id"
    )]
    MemberProfiles,
    #[sea_orm(
        belongs_to = "super::account_configurations::Entity",
        from = "Column::AccountId",
        to = "super::account_configurations::Column::Id"
    )]
    AccountConfigurations,
}

impl Related<super::member_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberProfiles.def()
    }
}

impl Related<super::account_configurations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountConfigurations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
