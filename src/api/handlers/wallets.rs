use super::ListQuery;
use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery, Caller},
        response::{ApiResult, OptionExt, Reply, ResultExt},
    },
    core::{
        transaction::list_wallet_transactions,
        wallet::{self, FundsRequest, TransferReceipt, TransferRequest, WalletMovement, WalletOverview},
    },
    entities::{transaction, wallet as wallet_entity},
};
use axum::extract::State;
use serde::Deserialize;

/// Body of `POST /wallets`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletBody {
    pub user_id: i64,
    pub balance: Option<f64>,
}

/// Body of `PATCH /wallets`.
#[derive(Debug, Deserialize)]
pub struct SetBalanceBody {
    pub id: i64,
    pub balance: f64,
}

/// `POST /wallets`
pub async fn create_wallet(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateWalletBody>,
) -> ApiResult<wallet_entity::Model> {
    let wallet = wallet::create_wallet(state.db.as_ref(), body.user_id, body.balance)
        .await
        .or_respond("Failed to create wallet")?;
    Ok(Reply::created(wallet))
}

/// `GET /wallets`
pub async fn list_wallets(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<wallet_entity::Model>> {
    let page = wallet::list_wallets(state.db.as_ref(), query.page_request(&state))
        .await
        .or_respond("Failed to fetch wallets")?;
    Ok(Reply::page(page))
}

/// `PATCH /wallets`
pub async fn set_wallet_balance(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SetBalanceBody>,
) -> ApiResult<wallet_entity::Model> {
    let wallet = wallet::set_wallet_balance(state.db.as_ref(), body.id, body.balance)
        .await
        .or_respond("Failed to update wallet")?;
    Ok(Reply::ok(wallet))
}

/// `GET /wallets/{id}`
pub async fn get_wallet(
    State(state): State<AppState>,
    ApiPath(wallet_id): ApiPath<i64>,
) -> ApiResult<wallet_entity::Model> {
    let wallet = wallet::get_wallet_by_id(state.db.as_ref(), wallet_id)
        .await
        .or_respond("Failed to fetch wallet")?
        .or_not_found("Wallet")?;
    Ok(Reply::ok(wallet))
}

/// `DELETE /wallets/{id}` - only the owner may delete.
pub async fn delete_wallet(
    State(state): State<AppState>,
    Caller(caller_id): Caller,
    ApiPath(wallet_id): ApiPath<i64>,
) -> ApiResult<wallet_entity::Model> {
    let wallet = wallet::delete_wallet(state.db.as_ref(), wallet_id, caller_id)
        .await
        .or_respond("Failed to delete wallet")?;
    Ok(Reply::ok(wallet))
}

/// `GET /wallets/{id}/transactions`
pub async fn wallet_transactions(
    State(state): State<AppState>,
    ApiPath(wallet_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<transaction::Model>> {
    let page = list_wallet_transactions(
        state.db.as_ref(),
        wallet_id,
        query.search.as_deref(),
        query.page_request(&state),
    )
    .await
    .or_respond("Failed to fetch transactions")?;
    Ok(Reply::page(page))
}

/// `POST /wallets/{id}/fund`
pub async fn fund_wallet(
    State(state): State<AppState>,
    ApiPath(wallet_id): ApiPath<i64>,
    ApiJson(body): ApiJson<FundsRequest>,
) -> ApiResult<WalletMovement> {
    let movement = wallet::fund_wallet(state.db.as_ref(), wallet_id, body)
        .await
        .or_respond("Failed to fund wallet")?;
    Ok(Reply::ok(movement))
}

/// `POST /wallets/{id}/withdraw`
pub async fn withdraw_from_wallet(
    State(state): State<AppState>,
    ApiPath(wallet_id): ApiPath<i64>,
    ApiJson(body): ApiJson<FundsRequest>,
) -> ApiResult<WalletMovement> {
    let movement = wallet::withdraw_from_wallet(state.db.as_ref(), wallet_id, body)
        .await
        .or_respond("Failed to withdraw from wallet")?;
    Ok(Reply::ok(movement))
}

/// `POST /wallets/{id}/transfer`
pub async fn transfer_to_child(
    State(state): State<AppState>,
    ApiPath(wallet_id): ApiPath<i64>,
    ApiJson(body): ApiJson<TransferRequest>,
) -> ApiResult<TransferReceipt> {
    let receipt = wallet::transfer_to_child(state.db.as_ref(), wallet_id, body)
        .await
        .or_respond("Failed to transfer funds")?;
    Ok(Reply::ok(receipt))
}

/// `GET /wallets/user/{id}`
pub async fn wallet_for_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<WalletOverview> {
    let overview = wallet::get_wallet_by_user_id(state.db.as_ref(), user_id)
        .await
        .or_respond("Failed to fetch wallet")?
        .or_not_found("Wallet")?;
    Ok(Reply::ok(overview))
}
