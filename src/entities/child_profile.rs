//! Child profile entity - A pupil and the balance on their canteen card.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Child profile database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "child_profiles")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the child
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name of the child
    pub name: String,
    /// School class, e.g. "Primary 3"
    #[sea_orm(column_name = "class")]
    #[serde(rename = "class")]
    pub class_name: String,
    /// Parent user who manages this child
    pub parent_id: i64,
    /// Balance available on the child's canteen card
    pub card_balance: f64,
    /// Inactive children cannot make purchases
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between ChildProfile and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each child belongs to one parent
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ParentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
    /// One child has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parent.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
