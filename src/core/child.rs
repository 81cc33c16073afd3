//! Child profile business logic - Pupils, their parents and their canteen cards.
//!
//! The card balance is never edited directly: it only moves through wallet transfers
//! ([`credit_card`]) and canteen purchases ([`debit_card`]).

use crate::{
    core::{transaction::get_transactions_for_child, user::get_user_by_id},
    entities::{ChildProfile, Transaction, child_profile, transaction, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Input for [`create_child`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChild {
    pub name: String,
    pub class: String,
    pub parent_id: i64,
    pub is_active: Option<bool>,
}

/// Fields a parent may change on a child profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildUpdate {
    pub name: Option<String>,
    pub class: Option<String>,
    pub is_active: Option<bool>,
}

/// A child with their parent and card history.
#[derive(Debug, Clone, Serialize)]
pub struct ChildDetails {
    #[serde(flatten)]
    pub child: child_profile::Model,
    pub parent: Option<user::Model>,
    pub transactions: Vec<transaction::Model>,
}

/// A child with their card history, as listed for a parent.
#[derive(Debug, Clone, Serialize)]
pub struct ChildWithTransactions {
    #[serde(flatten)]
    pub child: child_profile::Model,
    pub transactions: Vec<transaction::Model>,
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Registers a child under an existing parent with an empty card.
///
/// # Errors
/// - `Validation` when the name or class is blank
/// - `NotFound` when the parent does not exist
#[instrument(skip(db, new_child), fields(parent_id = new_child.parent_id))]
pub async fn create_child(
    db: &DatabaseConnection,
    new_child: NewChild,
) -> Result<child_profile::Model> {
    let name = required(&new_child.name, "Name")?;
    let class_name = required(&new_child.class, "Class")?;

    if get_user_by_id(db, new_child.parent_id).await?.is_none() {
        return Err(Error::not_found("Parent", new_child.parent_id));
    }

    let now = chrono::Utc::now();
    let child = child_profile::ActiveModel {
        name: Set(name),
        class_name: Set(class_name),
        parent_id: Set(new_child.parent_id),
        card_balance: Set(0.0),
        is_active: Set(new_child.is_active.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created child {} for parent {}", child.id, child.parent_id);
    Ok(child)
}

/// Finds a child by id.
pub async fn get_child_by_id<C>(db: &C, child_id: i64) -> Result<Option<child_profile::Model>>
where
    C: ConnectionTrait,
{
    ChildProfile::find_by_id(child_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a child with their parent and transactions, newest first.
pub async fn get_child_details(
    db: &DatabaseConnection,
    child_id: i64,
) -> Result<Option<ChildDetails>> {
    let Some(child) = get_child_by_id(db, child_id).await? else {
        return Ok(None);
    };
    let parent = get_user_by_id(db, child.parent_id).await?;
    let transactions = get_transactions_for_child(db, child.id).await?;

    Ok(Some(ChildDetails {
        child,
        parent,
        transactions,
    }))
}

/// Lists a parent's children with their transactions.
pub async fn list_children_by_parent(
    db: &DatabaseConnection,
    parent_id: i64,
) -> Result<Vec<ChildWithTransactions>> {
    // find_with_related orders by child id first; names are sorted afterwards
    let rows = ChildProfile::find()
        .filter(child_profile::Column::ParentId.eq(parent_id))
        .find_with_related(Transaction)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    let mut children: Vec<ChildWithTransactions> = rows
        .into_iter()
        .map(|(child, transactions)| ChildWithTransactions {
            child,
            transactions,
        })
        .collect();
    children.sort_by(|a, b| a.child.name.cmp(&b.child.name));
    Ok(children)
}

/// Lists every child in the school by name. Used by canteen staff.
pub async fn list_all_children(db: &DatabaseConnection) -> Result<Vec<child_profile::Model>> {
    ChildProfile::find()
        .order_by_asc(child_profile::Column::Name)
        .order_by_asc(child_profile::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to a child profile.
#[instrument(skip(db, update))]
pub async fn update_child(
    db: &DatabaseConnection,
    child_id: i64,
    update: ChildUpdate,
) -> Result<child_profile::Model> {
    let child = get_child_by_id(db, child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", child_id))?;

    let mut active: child_profile::ActiveModel = child.into();
    if let Some(name) = update.name {
        active.name = Set(required(&name, "Name")?);
    }
    if let Some(class) = update.class {
        active.class_name = Set(required(&class, "Class")?);
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now());

    let child = active.update(db).await?;
    info!("Updated child {}", child.id);
    Ok(child)
}

/// Deletes a child profile. Their transactions stay, detached from the card.
#[instrument(skip(db))]
pub async fn delete_child(
    db: &DatabaseConnection,
    child_id: i64,
) -> Result<child_profile::Model> {
    let child = get_child_by_id(db, child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", child_id))?;
    ChildProfile::delete_by_id(child_id).exec(db).await?;
    info!("Deleted child {}", child_id);
    Ok(child)
}

/// Adds `amount` to a child's card in a single UPDATE.
pub(crate) async fn credit_card<C>(
    db: &C,
    child_id: i64,
    amount: f64,
) -> Result<child_profile::Model>
where
    C: ConnectionTrait,
{
    let result = ChildProfile::update_many()
        .col_expr(
            child_profile::Column::CardBalance,
            Expr::col(child_profile::Column::CardBalance).add(amount),
        )
        .col_expr(
            child_profile::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(child_profile::Column::Id.eq(child_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Child", child_id));
    }
    get_child_by_id(db, child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", child_id))
}

/// Subtracts `amount` from a child's card, refusing to go below zero.
///
/// # Errors
/// - `NotFound` when the child does not exist
/// - `InsufficientFunds` when the card balance is smaller than `amount`
pub(crate) async fn debit_card<C>(
    db: &C,
    child_id: i64,
    amount: f64,
) -> Result<child_profile::Model>
where
    C: ConnectionTrait,
{
    let before = get_child_by_id(db, child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", child_id))?;

    let result = ChildProfile::update_many()
        .col_expr(
            child_profile::Column::CardBalance,
            Expr::col(child_profile::Column::CardBalance).sub(amount),
        )
        .col_expr(
            child_profile::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(child_profile::Column::Id.eq(child_id))
        .filter(child_profile::Column::CardBalance.gte(amount))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        debug!(
            "Card debit of {:.2} refused for child {} (balance {:.2})",
            amount, child_id, before.card_balance
        );
        return Err(Error::InsufficientFunds {
            current: before.card_balance,
            required: amount,
        });
    }
    get_child_by_id(db, child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", child_id))
}
