//! HTTP layer - axum router, shared state and the JSON response envelope.
//!
//! Every route lives under `/api/v1` and needs an `x-api-key`, except signup
//! (`POST /api/v1/users`) and `/health`.

/// Extractors that reject with the JSON envelope
pub mod extract;
/// Route handlers
pub mod handlers;
/// API key gate
pub mod middleware;
/// Response envelope and error mapping
pub mod response;

use crate::config::AppConfig;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use handlers::{canteen, children, transactions, users, wallets};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Shared data available to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all database operations
    pub db: Arc<DatabaseConnection>,
    /// Loaded application settings
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self {
            db: Arc::new(db),
            config,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!("Ignoring invalid CORS origin {:?}: {}", origin, e))
                .ok()
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user).delete(users::delete_user))
        .route(
            "/wallets",
            get(wallets::list_wallets)
                .post(wallets::create_wallet)
                .patch(wallets::set_wallet_balance),
        )
        .route(
            "/wallets/:id",
            get(wallets::get_wallet).delete(wallets::delete_wallet),
        )
        .route("/wallets/:id/transactions", get(wallets::wallet_transactions))
        .route("/wallets/:id/fund", post(wallets::fund_wallet))
        .route("/wallets/:id/withdraw", post(wallets::withdraw_from_wallet))
        .route("/wallets/:id/transfer", post(wallets::transfer_to_child))
        .route("/wallets/user/:id", get(wallets::wallet_for_user))
        .route("/children", post(children::create_child))
        .route(
            "/children/:id",
            get(children::get_child)
                .patch(children::update_child)
                .delete(children::delete_child),
        )
        .route("/children/parent/:id", get(children::children_of_parent))
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/canteen", post(canteen::register_canteen))
        .route("/canteen/children", get(canteen::list_children))
        .route(
            "/canteen/products",
            get(canteen::list_products).post(canteen::create_product),
        )
        .route("/canteen/products/:id", patch(canteen::update_product))
        .route("/canteen/transaction", post(canteen::checkout))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ));

    let public = Router::new().route("/users", post(users::create_user));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server.allowed_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests;
