//! Role entity - Access level assigned to every user.
//!
//! Roles are seeded at startup (`ADMIN`, `PARENT`, `CANTEEN_MANAGER`) and referenced
//! by name when users sign up.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    /// Unique identifier for the role
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Role name, e.g. `"PARENT"`
    #[sea_orm(unique)]
    pub name: String,
    /// Human-readable summary of what the role may do
    pub description: String,
    /// Comma-separated permission list (`"create,delete,update"`)
    pub permissions: String,
}

/// Defines relationships between Role and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One role is held by many users
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
