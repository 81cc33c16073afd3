//! API key gate for every `/api/v1` route except signup.

use super::{AppState, response::ApiError};
use crate::core::api_key::validate_api_key;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

/// Header carrying the client's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests without a known `x-api-key` and exposes the key to handlers.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    let Some(presented) = presented else {
        return ApiError::new(StatusCode::UNAUTHORIZED, "API-Key Is Required").into_response();
    };

    match validate_api_key(state.db.as_ref(), &presented).await {
        Ok(Some(api_key)) => {
            debug!("Request authenticated with key {} of user {}", api_key.id, api_key.user_id);
            request.extensions_mut().insert(api_key);
            next.run(request).await
        }
        Ok(None) => {
            warn!("Rejected unknown API key on {}", request.uri().path());
            ApiError::new(StatusCode::FORBIDDEN, "Invalid API-Key").into_response()
        }
        Err(e) => {
            error!("Failed to validate API key: {}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to validate API-Key")
                .into_response()
        }
    }
}
