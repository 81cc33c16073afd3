//! Transaction business logic - Recording, listing and canteen checkout.
//!
//! Transactions are only ever written as a side effect of a balance change, inside the
//! same database transaction as that change. [`record_transaction`] is the generic entry
//! point that picks the right balance operation from the transaction type; the canteen
//! checkout in [`process_purchase`] debits a child's card for a basket of products.

use crate::{
    core::{
        canteen::require_canteen_manager,
        child::{debit_card, get_child_by_id},
        pagination::{Page, PageRequest, Pagination},
        validate_amount,
        wallet::{
            FundsRequest, TransferRequest, fund_wallet, get_wallet_for_user,
            transfer_to_child, withdraw_from_wallet,
        },
    },
    entities::{
        Canteen, Product, Transaction, User, Wallet, child_profile, product, transaction,
        transaction::{TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Row to insert into `transactions`, built up with the links that apply.
#[derive(Debug, Clone)]
pub(crate) struct TransactionRecord {
    amount: f64,
    transaction_type: TransactionType,
    description: String,
    reference: Option<String>,
    user_id: Option<i64>,
    wallet_id: Option<i64>,
    child_profile_id: Option<i64>,
    canteen_id: Option<i64>,
    product_id: Option<i64>,
}

impl TransactionRecord {
    pub(crate) fn new(amount: f64, transaction_type: TransactionType, description: &str) -> Self {
        Self {
            amount,
            transaction_type,
            description: description.to_string(),
            reference: None,
            user_id: None,
            wallet_id: None,
            child_profile_id: None,
            canteen_id: None,
            product_id: None,
        }
    }

    pub(crate) const fn by_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub(crate) const fn on_wallet(mut self, wallet_id: i64) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    pub(crate) const fn for_child(mut self, child_id: i64) -> Self {
        self.child_profile_id = Some(child_id);
        self
    }

    pub(crate) const fn at_canteen(mut self, canteen_id: i64) -> Self {
        self.canteen_id = Some(canteen_id);
        self
    }

    pub(crate) const fn of_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub(crate) fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference.filter(|r| !r.trim().is_empty());
        self
    }
}

/// Inserts a completed transaction. Callers run this inside the transaction that moved the money.
pub(crate) async fn insert_transaction<C>(
    db: &C,
    record: TransactionRecord,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    transaction::ActiveModel {
        amount: Set(record.amount),
        transaction_type: Set(record.transaction_type),
        status: Set(TransactionStatus::Completed),
        description: Set(record.description),
        reference: Set(record.reference),
        user_id: Set(record.user_id),
        wallet_id: Set(record.wallet_id),
        child_profile_id: Set(record.child_profile_id),
        canteen_id: Set(record.canteen_id),
        product_id: Set(record.product_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Input for [`record_transaction`]. Which ids are required depends on the type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub user_id: Option<i64>,
    pub wallet_id: Option<i64>,
    pub child_profile_id: Option<i64>,
    pub canteen_id: Option<i64>,
    pub product_id: Option<i64>,
}

/// Input for [`process_purchase`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub child_id: i64,
    /// Repeating an id buys that product more than once
    pub product_ids: Vec<i64>,
}

/// Outcome of a canteen checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub child: child_profile::Model,
    pub transactions: Vec<transaction::Model>,
    pub total: f64,
}

fn require_id(id: Option<i64>, field: &str, transaction_type: TransactionType) -> Result<i64> {
    id.ok_or_else(|| {
        Error::validation(format!(
            "{field} is required for {transaction_type:?} transactions"
        ))
    })
}

/// Records a transaction and applies its balance change.
///
/// - `DEPOSIT` credits `walletId`
/// - `WITHDRAWAL` debits `walletId`
/// - `TRANSFER` moves from `walletId` to `childProfileId`
/// - `PURCHASE` debits the card of `childProfileId` without a canteen manager check;
///   managers check out baskets through [`process_purchase`]
///
/// # Errors
/// - `Validation` when an id the type needs is missing
/// - `NotFound` when a linked user, wallet, canteen or product does not exist
/// - any error of the underlying balance operation
#[instrument(skip(db, new_transaction), fields(kind = ?new_transaction.transaction_type))]
pub async fn record_transaction(
    db: &DatabaseConnection,
    new_transaction: NewTransaction,
) -> Result<transaction::Model> {
    validate_amount(new_transaction.amount)?;
    let kind = new_transaction.transaction_type;

    match kind {
        TransactionType::Deposit | TransactionType::Withdrawal => {
            let wallet_id = require_id(new_transaction.wallet_id, "walletId", kind)?;
            let request = FundsRequest {
                amount: new_transaction.amount,
                description: new_transaction.description,
                reference: new_transaction.reference,
            };
            let movement = if kind == TransactionType::Deposit {
                fund_wallet(db, wallet_id, request).await?
            } else {
                withdraw_from_wallet(db, wallet_id, request).await?
            };
            Ok(movement.transaction)
        }
        TransactionType::Transfer => {
            let wallet_id = require_id(new_transaction.wallet_id, "walletId", kind)?;
            let child_id = require_id(new_transaction.child_profile_id, "childProfileId", kind)?;
            let receipt = transfer_to_child(
                db,
                wallet_id,
                TransferRequest {
                    child_id,
                    amount: new_transaction.amount,
                    description: new_transaction.description,
                },
            )
            .await?;
            Ok(receipt.transaction)
        }
        TransactionType::Purchase => record_card_purchase(db, new_transaction).await,
    }
}

/// Fails with `NotFound` when an optional link names a row that does not exist.
async fn ensure_linked<E, C>(db: &C, id: Option<i64>, entity: &'static str) -> Result<()>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(());
    };
    match E::find_by_id(id).one(db).await? {
        Some(_) => Ok(()),
        None => Err(Error::not_found(entity, id)),
    }
}

/// Debits a child's card directly, outside the canteen checkout.
///
/// Administrative path: no canteen manager is involved, so the optional
/// `userId`/`walletId`/`canteenId`/`productId` links are only checked for existence.
async fn record_card_purchase(
    db: &DatabaseConnection,
    new_transaction: NewTransaction,
) -> Result<transaction::Model> {
    let kind = TransactionType::Purchase;
    let child_id = require_id(new_transaction.child_profile_id, "childProfileId", kind)?;

    let txn = db.begin().await?;
    let child = get_child_by_id(&txn, child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", child_id))?;
    if !child.is_active {
        return Err(Error::validation(format!("{}'s card is inactive", child.name)));
    }
    ensure_linked::<User, _>(&txn, new_transaction.user_id, "User").await?;
    ensure_linked::<Wallet, _>(&txn, new_transaction.wallet_id, "Wallet").await?;
    ensure_linked::<Canteen, _>(&txn, new_transaction.canteen_id, "Canteen").await?;
    ensure_linked::<Product, _>(&txn, new_transaction.product_id, "Product").await?;

    let child = debit_card(&txn, child.id, new_transaction.amount).await?;

    let mut record = TransactionRecord::new(
        new_transaction.amount,
        kind,
        new_transaction.description.as_deref().unwrap_or("Canteen purchase"),
    )
    .for_child(child.id)
    .with_reference(new_transaction.reference);
    if let Some(user_id) = new_transaction.user_id {
        record = record.by_user(user_id);
    }
    if let Some(wallet_id) = new_transaction.wallet_id {
        record = record.on_wallet(wallet_id);
    }
    if let Some(canteen_id) = new_transaction.canteen_id {
        record = record.at_canteen(canteen_id);
    }
    if let Some(product_id) = new_transaction.product_id {
        record = record.of_product(product_id);
    }
    let transaction = insert_transaction(&txn, record).await?;
    txn.commit().await?;

    info!("Recorded purchase of {:.2} on child {}", transaction.amount, child_id);
    Ok(transaction)
}

/// Lists a wallet's transactions newest first, optionally searching the description.
///
/// # Errors
/// - `NotFound` when the wallet does not exist
pub async fn list_wallet_transactions(
    db: &DatabaseConnection,
    wallet_id: i64,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<transaction::Model>> {
    if Wallet::find_by_id(wallet_id).one(db).await?.is_none() {
        return Err(Error::not_found("Wallet", wallet_id));
    }

    let mut query = Transaction::find().filter(transaction::Column::WalletId.eq(wallet_id));
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(transaction::Column::Description.contains(term));
    }

    let paginator = query
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.index()).await?;

    Ok(Page {
        items,
        pagination: Pagination::new(request, total),
    })
}

/// All transactions of a wallet, newest first.
pub async fn get_transactions_for_wallet<C>(
    db: &C,
    wallet_id: i64,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::WalletId.eq(wallet_id))
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All transactions touching a child's card, newest first.
pub async fn get_transactions_for_child<C>(
    db: &C,
    child_id: i64,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::ChildProfileId.eq(child_id))
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Checks out a basket of products against a child's card at the manager's canteen.
///
/// The card is debited once for the basket total; one `PURCHASE` row is written per
/// product, linked to the parent's wallet when the parent has one.
///
/// # Errors
/// - `Validation` for an empty basket, an unavailable product or an inactive card
/// - `Forbidden` / `NotFound` from the canteen manager check
/// - `NotFound` when the child or a product of this canteen does not exist
/// - `InsufficientFunds` when the card cannot cover the total
#[instrument(skip(db, request), fields(child_id = request.child_id, items = request.product_ids.len()))]
pub async fn process_purchase(
    db: &DatabaseConnection,
    manager_id: i64,
    request: PurchaseRequest,
) -> Result<PurchaseReceipt> {
    if request.product_ids.is_empty() {
        return Err(Error::validation("Select at least one product"));
    }

    let (manager, canteen) = require_canteen_manager(db, manager_id).await?;

    let catalogue: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::CanteenId.eq(canteen.id))
        .filter(product::Column::Id.is_in(request.product_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut basket = Vec::with_capacity(request.product_ids.len());
    for id in &request.product_ids {
        let product = catalogue
            .get(id)
            .ok_or_else(|| Error::not_found("Product", id))?;
        if !product.is_available {
            return Err(Error::validation(format!(
                "{} is not available",
                product.name
            )));
        }
        basket.push(product);
    }
    let total: f64 = basket.iter().map(|p| p.price).sum();

    let txn = db.begin().await?;

    let child = get_child_by_id(&txn, request.child_id)
        .await?
        .ok_or_else(|| Error::not_found("Child", request.child_id))?;
    if !child.is_active {
        return Err(Error::validation(format!("{}'s card is inactive", child.name)));
    }
    let child = debit_card(&txn, child.id, total).await?;
    let wallet = get_wallet_for_user(&txn, child.parent_id).await?;

    let mut transactions = Vec::with_capacity(basket.len());
    for product in basket {
        let mut record = TransactionRecord::new(
            product.price,
            TransactionType::Purchase,
            &format!("{} at {}", product.name, canteen.name),
        )
        .by_user(manager.id)
        .for_child(child.id)
        .at_canteen(canteen.id)
        .of_product(product.id);
        if let Some(wallet) = &wallet {
            record = record.on_wallet(wallet.id);
        }
        transactions.push(insert_transaction(&txn, record).await?);
    }

    txn.commit().await?;

    info!(
        "Child {} bought {} item(s) for {:.2} at canteen {}",
        child.id,
        transactions.len(),
        total,
        canteen.id
    );
    Ok(PurchaseReceipt {
        child,
        transactions,
        total,
    })
}
