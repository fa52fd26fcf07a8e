//! `SeaORM` Entity for member_type_histories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "member_type_histories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub member_profile_id: Uuid,
    pub member_type_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member_profiles::Entity",
        from = "Column::MemberProfileId",
        to = "super::member_profiles::Column::Id",
        on_delete = "Cascade"
    )]
    MemberProfiles,
}

impl Related<super::member_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
