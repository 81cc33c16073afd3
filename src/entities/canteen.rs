//! Canteen entity - A school canteen run by one manager.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Canteen database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "canteens")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    /// User holding the `CANTEEN_MANAGER` role; one canteen each
    #[sea_orm(unique)]
    pub manager_id: i64,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Canteen and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ManagerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Manager,
    /// One canteen sells many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
