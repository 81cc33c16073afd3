//! Product entity - An item on sale in a canteen.
//!
//! Products carry a fixed price; checking out a list of products debits the sum of
//! their prices from a child's card.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Chapati", "Juice")
    pub name: String,
    /// Fixed price per unit
    pub price: f64,
    /// Canteen selling this product
    pub canteen_id: i64,
    /// Unavailable products cannot be checked out
    pub is_available: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one canteen
    #[sea_orm(
        belongs_to = "super::canteen::Entity",
        from = "Column::CanteenId",
        to = "super::canteen::Column::Id",
        on_delete = "Cascade"
    )]
    Canteen,
}

impl Related<super::canteen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Canteen.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
