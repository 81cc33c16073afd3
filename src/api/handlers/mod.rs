//! Route handlers, one module per resource.
//!
//! Handlers only translate between HTTP and [`crate::core`]: extract, call, wrap the
//! result in the response envelope.

#![allow(clippy::unused_async)]

/// `/canteen` routes for canteen managers
pub mod canteen;
/// `/children` routes
pub mod children;
/// `/transactions` routes
pub mod transactions;
/// `/users` routes, including signup
pub mod users;
/// `/wallets` routes
pub mod wallets;

use super::{
    AppState,
    response::{ApiError, Reply},
};
use crate::core::pagination::{PageParams, PageRequest};
use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

/// `?search=&page=&limit=` accepted by list routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    fn page_request(&self, state: &AppState) -> PageRequest {
        PageRequest::from_params(
            PageParams {
                page: self.page,
                limit: self.limit,
            },
            &state.config.pagination,
        )
    }
}

/// Liveness probe that also checks the database answers.
pub async fn health(State(state): State<AppState>) -> Result<Reply<Value>, ApiError> {
    state.db.ping().await.map_err(|e| {
        error!("Health check failed: {}", e);
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    })?;
    Ok(Reply::ok(json!({ "status": "ok" })))
}
