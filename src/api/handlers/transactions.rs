use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiQuery},
        response::{ApiError, ApiResult, Reply, ResultExt},
    },
    core::{
        pagination::{PageParams, PageRequest},
        transaction::{self, NewTransaction},
    },
    entities::transaction as transaction_entity,
};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

/// `?walletId=&search=&page=&limit=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub wallet_id: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// `POST /transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewTransaction>,
) -> ApiResult<transaction_entity::Model> {
    let recorded = transaction::record_transaction(state.db.as_ref(), body)
        .await
        .or_respond("Failed to create transaction")?;
    Ok(Reply::created(recorded))
}

/// `GET /transactions` - a wallet's history; `walletId` is required.
pub async fn list_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> ApiResult<Vec<transaction_entity::Model>> {
    let wallet_id = query
        .wallet_id
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "walletId is required"))?;
    let request = PageRequest::from_params(
        PageParams {
            page: query.page,
            limit: query.limit,
        },
        &state.config.pagination,
    );

    let page = transaction::list_wallet_transactions(
        state.db.as_ref(),
        wallet_id,
        query.search.as_deref(),
        request,
    )
    .await
    .or_respond("Failed to fetch transactions")?;
    Ok(Reply::page(page))
}
