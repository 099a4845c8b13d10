//! Organization entity - the primary TMF632 party-management aggregate

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub href: Option<String>,
    pub is_head_office: Option<bool>,
    pub is_legal_entity: Option<bool>,
    pub name: Option<String>,
    pub name_type: Option<String>,
    pub organization_type: Option<String>,
    pub trading_name: Option<String>,
    /// FK to the owned TimePeriod row, if any.
    pub exists_during: Option<i32>,
    /// "initialized", "validated" or "closed".
    pub status: Option<String>,
    pub base_type: Option<String>,
    pub schema_location: Option<String>,
    pub schema_type: Option<String>,
    /// Soft-delete flag. Deleted rows never appear in read paths.
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::time_period::Entity",
        from = "Column::ExistsDuring",
        to = "super::time_period::Column::Id"
    )]
    TimePeriod,
    #[sea_orm(has_many = "super::characteristic::Entity")]
    Characteristic,
    #[sea_orm(has_many = "super::authorized_user::Entity")]
    AuthorizedUser,
}

impl Related<super::time_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimePeriod.def()
    }
}

impl Related<super::characteristic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Characteristic.def()
    }
}

impl Related<super::authorized_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorizedUser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
