//! Transaction entity - Every movement of money in the system.
//!
//! A transaction always carries a positive `amount`; its direction comes from
//! `transaction_type`. Optional foreign keys record which wallet, child card, canteen
//! and product were involved.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of money movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money added to a wallet
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    /// Money taken out of a wallet
    #[sea_orm(string_value = "WITHDRAWAL")]
    Withdrawal,
    /// Wallet to child card
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
    /// Child card spent at a canteen
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
}

/// Settlement state of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Always positive; see `transaction_type` for direction
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    /// Human-readable description of the transaction
    pub description: String,
    /// Optional external or client-supplied reference
    pub reference: Option<String>,
    /// User who initiated the transaction
    pub user_id: Option<i64>,
    pub wallet_id: Option<i64>,
    pub child_profile_id: Option<i64>,
    pub canteen_id: Option<i64>,
    pub product_id: Option<i64>,
    /// When the transaction was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::wallet::Entity",
        from = "Column::WalletId",
        to = "super::wallet::Column::Id",
        on_delete = "SetNull"
    )]
    Wallet,
    #[sea_orm(
        belongs_to = "super::child_profile::Entity",
        from = "Column::ChildProfileId",
        to = "super::child_profile::Column::Id",
        on_delete = "SetNull"
    )]
    ChildProfile,
    #[sea_orm(
        belongs_to = "super::canteen::Entity",
        from = "Column::CanteenId",
        to = "super::canteen::Column::Id",
        on_delete = "SetNull"
    )]
    Canteen,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "SetNull"
    )]
    Product,
}

impl Related<super::wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::child_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChildProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
