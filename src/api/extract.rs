//! Request extractors that answer malformed input with the JSON error envelope.

use super::response::ApiError;
use crate::entities::api_key;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{StatusCode, request::Parts},
};

/// JSON body; a malformed body becomes a `400` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; a non-numeric id becomes a `400` envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string; bad paging values become a `400` envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Header naming the user a request acts for.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the user making the request.
///
/// Taken from `x-user-id`; when the header is absent, the owner of the presented API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(USER_ID_HEADER) {
            return value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(Self)
                .ok_or_else(|| {
                    ApiError::new(StatusCode::BAD_REQUEST, "x-user-id must be a numeric user id")
                });
        }

        parts
            .extensions
            .get::<api_key::Model>()
            .map(|key| Self(key.user_id))
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "x-user-id header is required"))
    }
}
