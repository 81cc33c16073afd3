//! API key entity - Static keys accepted in the `x-api-key` header.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// API key database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Label shown to the owner, e.g. "Default Key"
    pub name: String,
    /// `sk_live_` followed by 64 lowercase hex characters
    #[sea_orm(unique)]
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between ApiKey and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
