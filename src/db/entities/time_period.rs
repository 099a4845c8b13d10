//! TimePeriod entity - validity window owned by a single Organization.
//!
//! Rows are never mutated in place: an update that supplies a new period
//! soft-deletes the old row and inserts a fresh one.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "time_periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub start_date_time: Option<DateTimeUtc>,
    pub end_date_time: Option<DateTimeUtc>,
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::organization::Entity")]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
