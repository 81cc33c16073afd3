//! Wallet business logic - Parent balances and the money that moves through them.
//!
//! Deposits credit a wallet, withdrawals debit it, and transfers move money from a
//! wallet onto one of the parent's children's cards. Every movement runs inside a single
//! database transaction and records a `transactions` row.
//!
//! Debits never read-modify-write the balance. They issue
//! `UPDATE wallets SET balance = balance - x WHERE id = ? AND balance >= x`, so a concurrent
//! debit that got there first makes this one affect zero rows, which is reported as
//! insufficient funds and rolls the whole transaction back.

use crate::{
    core::{
        child::{credit_card, get_child_by_id},
        pagination::{Page, PageRequest, Pagination},
        transaction::{TransactionRecord, get_transactions_for_wallet, insert_transaction},
        user::get_user_by_id,
        validate_amount,
    },
    entities::{
        ChildProfile, Wallet, child_profile, transaction, transaction::TransactionType, user,
        wallet,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const ALREADY_HAS_WALLET: &str = "This user already has a wallet";

/// Everything a parent's dashboard shows about their wallet.
#[derive(Debug, Clone, Serialize)]
pub struct WalletOverview {
    #[serde(flatten)]
    pub wallet: wallet::Model,
    pub user: WalletOwner,
    pub transactions: Vec<transaction::Model>,
}

/// Wallet owner together with the children they can transfer to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOwner {
    #[serde(flatten)]
    pub user: user::Model,
    pub child_profiles: Vec<child_profile::Model>,
}

/// A deposit or withdrawal request.
#[derive(Debug, Clone, Deserialize)]
pub struct FundsRequest {
    pub amount: f64,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// A wallet-to-card transfer request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub child_id: i64,
    pub amount: f64,
    pub description: Option<String>,
}

/// Wallet state after a deposit or withdrawal, and the transaction that caused it.
#[derive(Debug, Clone, Serialize)]
pub struct WalletMovement {
    pub wallet: wallet::Model,
    pub transaction: transaction::Model,
}

/// Both balances after a transfer, and the transaction that moved the money.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub wallet: wallet::Model,
    pub child: child_profile::Model,
    pub transaction: transaction::Model,
}

async fn find_wallet<C>(db: &C, wallet_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    Wallet::find_by_id(wallet_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Wallet", wallet_id))
}

/// Inserts an empty wallet for `user_id`. Used at signup.
///
/// # Errors
/// - `Conflict` when the user already owns a wallet
pub(crate) async fn open_wallet<C>(db: &C, user_id: i64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    wallet::ActiveModel {
        balance: Set(0.0),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| Error::conflict_on_duplicate(e, ALREADY_HAS_WALLET))
}

/// Creates a wallet for an existing user who does not have one yet.
///
/// # Errors
/// - `InvalidAmount` when the opening balance is negative or not finite
/// - `NotFound` when the user does not exist
/// - `Conflict` when the user already owns a wallet
#[instrument(skip(db))]
pub async fn create_wallet(
    db: &DatabaseConnection,
    user_id: i64,
    opening_balance: Option<f64>,
) -> Result<wallet::Model> {
    let balance = opening_balance.unwrap_or(0.0);
    if !balance.is_finite() || balance < 0.0 {
        return Err(Error::InvalidAmount { amount: balance });
    }

    if get_user_by_id(db, user_id).await?.is_none() {
        return Err(Error::not_found("User", user_id));
    }
    if get_wallet_for_user(db, user_id).await?.is_some() {
        return Err(Error::Conflict {
            message: ALREADY_HAS_WALLET.to_string(),
        });
    }

    let txn = db.begin().await?;
    let mut wallet = open_wallet(&txn, user_id).await?;
    if balance > 0.0 {
        wallet = credit_wallet(&txn, wallet.id, balance).await?;
        insert_transaction(
            &txn,
            TransactionRecord::new(balance, TransactionType::Deposit, "Opening balance")
                .by_user(user_id)
                .on_wallet(wallet.id),
        )
        .await?;
    }
    txn.commit().await?;

    info!("Opened wallet {} for user {}", wallet.id, user_id);
    Ok(wallet)
}

/// Lists wallets newest first.
pub async fn list_wallets(
    db: &DatabaseConnection,
    request: PageRequest,
) -> Result<Page<wallet::Model>> {
    let paginator = Wallet::find()
        .order_by_desc(wallet::Column::CreatedAt)
        .order_by_desc(wallet::Column::Id)
        .paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.index()).await?;
    Ok(Page {
        items,
        pagination: Pagination::new(request, total),
    })
}

/// Finds a wallet by id.
pub async fn get_wallet_by_id(
    db: &DatabaseConnection,
    wallet_id: i64,
) -> Result<Option<wallet::Model>> {
    Wallet::find_by_id(wallet_id).one(db).await.map_err(Into::into)
}

/// Finds the wallet owned by `user_id`.
pub async fn get_wallet_for_user<C>(db: &C, user_id: i64) -> Result<Option<wallet::Model>>
where
    C: ConnectionTrait,
{
    Wallet::find()
        .filter(wallet::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a user's wallet with the owner, their children and the wallet's history.
pub async fn get_wallet_by_user_id(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<WalletOverview>> {
    let Some(wallet) = get_wallet_for_user(db, user_id).await? else {
        return Ok(None);
    };
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    let child_profiles = ChildProfile::find()
        .filter(child_profile::Column::ParentId.eq(user_id))
        .order_by_asc(child_profile::Column::Name)
        .all(db)
        .await?;
    let transactions = get_transactions_for_wallet(db, wallet.id).await?;

    Ok(Some(WalletOverview {
        wallet,
        user: WalletOwner {
            user,
            child_profiles,
        },
        transactions,
    }))
}

/// Overwrites a wallet balance. Administrative correction; no transaction is recorded.
#[instrument(skip(db))]
pub async fn set_wallet_balance(
    db: &DatabaseConnection,
    wallet_id: i64,
    balance: f64,
) -> Result<wallet::Model> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(Error::InvalidAmount { amount: balance });
    }

    let mut wallet: wallet::ActiveModel = find_wallet(db, wallet_id).await?.into();
    wallet.balance = Set(balance);
    wallet.updated_at = Set(chrono::Utc::now());
    let wallet = wallet.update(db).await?;

    info!("Wallet {} balance set to {:.2}", wallet_id, balance);
    Ok(wallet)
}

/// Deletes a wallet on behalf of its owner.
///
/// # Errors
/// - `NotFound` when the wallet does not exist
/// - `Forbidden` when `caller_id` does not own the wallet
#[instrument(skip(db))]
pub async fn delete_wallet(
    db: &DatabaseConnection,
    wallet_id: i64,
    caller_id: i64,
) -> Result<wallet::Model> {
    let wallet = find_wallet(db, wallet_id).await?;
    if wallet.user_id != caller_id {
        return Err(Error::Forbidden {
            message: "You don't have access to delete this wallet".to_string(),
        });
    }

    Wallet::delete_by_id(wallet_id).exec(db).await?;
    info!("Deleted wallet {}", wallet_id);
    Ok(wallet)
}

/// Adds `amount` to a wallet balance in a single UPDATE.
pub(crate) async fn credit_wallet<C>(db: &C, wallet_id: i64, amount: f64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    let result = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(amount),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(wallet::Column::Id.eq(wallet_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Wallet", wallet_id));
    }
    find_wallet(db, wallet_id).await
}

/// Subtracts `amount` from a wallet balance, refusing to go below zero.
///
/// # Errors
/// - `NotFound` when the wallet does not exist
/// - `InsufficientFunds` when the balance is smaller than `amount`
pub(crate) async fn debit_wallet<C>(db: &C, wallet_id: i64, amount: f64) -> Result<wallet::Model>
where
    C: ConnectionTrait,
{
    let before = find_wallet(db, wallet_id).await?;

    let result = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).sub(amount),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(wallet::Column::Id.eq(wallet_id))
        .filter(wallet::Column::Balance.gte(amount))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        debug!(
            "Debit of {:.2} refused on wallet {} (balance {:.2})",
            amount, wallet_id, before.balance
        );
        return Err(Error::InsufficientFunds {
            current: before.balance,
            required: amount,
        });
    }
    find_wallet(db, wallet_id).await
}

/// Deposits money into a wallet and records a `DEPOSIT` transaction.
#[instrument(skip(db, request), fields(amount = request.amount))]
pub async fn fund_wallet(
    db: &DatabaseConnection,
    wallet_id: i64,
    request: FundsRequest,
) -> Result<WalletMovement> {
    validate_amount(request.amount)?;

    let txn = db.begin().await?;
    let wallet = credit_wallet(&txn, wallet_id, request.amount).await?;
    let transaction = insert_transaction(
        &txn,
        TransactionRecord::new(
            request.amount,
            TransactionType::Deposit,
            request.description.as_deref().unwrap_or("Wallet top-up"),
        )
        .by_user(wallet.user_id)
        .on_wallet(wallet.id)
        .with_reference(request.reference),
    )
    .await?;
    txn.commit().await?;

    info!("Funded wallet {} with {:.2}", wallet_id, request.amount);
    Ok(WalletMovement {
        wallet,
        transaction,
    })
}

/// Takes money out of a wallet and records a `WITHDRAWAL` transaction.
#[instrument(skip(db, request), fields(amount = request.amount))]
pub async fn withdraw_from_wallet(
    db: &DatabaseConnection,
    wallet_id: i64,
    request: FundsRequest,
) -> Result<WalletMovement> {
    validate_amount(request.amount)?;

    let txn = db.begin().await?;
    let wallet = debit_wallet(&txn, wallet_id, request.amount).await?;
    let transaction = insert_transaction(
        &txn,
        TransactionRecord::new(
            request.amount,
            TransactionType::Withdrawal,
            request.description.as_deref().unwrap_or("Wallet withdrawal"),
        )
        .by_user(wallet.user_id)
        .on_wallet(wallet.id)
        .with_reference(request.reference),
    )
    .await?;
    txn.commit().await?;

    info!("Withdrew {:.2} from wallet {}", request.amount, wallet_id);
    Ok(WalletMovement {
        wallet,
        transaction,
    })
}

/// Moves money from a parent's wallet onto one of their children's cards.
///
/// The wallet debit, card credit and `TRANSFER` record commit together or not at all.
///
/// # Errors
/// - `InvalidAmount` for zero, negative or non-finite amounts
/// - `NotFound` when the wallet or child does not exist
/// - `Forbidden` when the child does not belong to the wallet owner
/// - `InsufficientFunds` when the wallet balance is smaller than the amount
#[instrument(skip(db, request), fields(child_id = request.child_id, amount = request.amount))]
pub async fn transfer_to_child(
    db: &DatabaseConnection,
    wallet_id: i64,
    request: TransferRequest,
) -> Result<TransferReceipt> {
    validate_amount(request.amount)?;

    let txn = db.begin().await?;

    let wallet = find_wallet(&txn, wallet_id).await?;
    let child = get_child_by_id(&txn, request.child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", request.child_id))?;
    if child.parent_id != wallet.user_id {
        return Err(Error::Forbidden {
            message: "Funds can only be transferred to the wallet owner's children".to_string(),
        });
    }

    let wallet = debit_wallet(&txn, wallet.id, request.amount).await?;
    let child = credit_card(&txn, child.id, request.amount).await?;
    let description = request
        .description
        .unwrap_or_else(|| format!("Transfer to {}'s card", child.name));
    let transaction = insert_transaction(
        &txn,
        TransactionRecord::new(request.amount, TransactionType::Transfer, &description)
            .by_user(wallet.user_id)
            .on_wallet(wallet.id)
            .for_child(child.id),
    )
    .await?;

    txn.commit().await?;

    info!(
        "Transferred {:.2} from wallet {} to child {}",
        request.amount, wallet.id, child.id
    );
    Ok(TransferReceipt {
        wallet,
        child,
        transaction,
    })
}
