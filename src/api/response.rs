//! The `{ success, data, error }` envelope every route answers with, and the mapping from
//! crate errors to HTTP statuses.

use crate::{
    core::pagination::{Page, Pagination},
    errors::Error,
};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

/// JSON body of every response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// A successful response: status code plus envelope.
#[derive(Debug)]
pub struct Reply<T> {
    status: StatusCode,
    body: ApiResponse<T>,
}

impl<T: Serialize> Reply<T> {
    /// `200 OK` carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: ApiResponse {
                success: true,
                data: Some(data),
                error: None,
                pagination: None,
            },
        }
    }

    /// `201 Created` carrying `data`.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: ApiResponse {
                success: true,
                data: Some(data),
                error: None,
                pagination: None,
            },
        }
    }
}

impl<T: Serialize> Reply<Vec<T>> {
    /// `200 OK` carrying one page of items and its paging metadata.
    pub fn page(page: Page<T>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ApiResponse {
                success: true,
                data: Some(page.items),
                error: None,
                pagination: Some(page.pagination),
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// A failed response: status code plus the message placed in `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Maps a crate error to a response.
    ///
    /// Domain errors keep their own message. Anything else is logged and answered with
    /// `500` and `context`, so database details never reach the client.
    pub fn from_error(error: Error, context: &'static str) -> Self {
        let status = match &error {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation { .. } | Error::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::Config { .. }
            | Error::Database(_)
            | Error::Io(_)
            | Error::PasswordHash { .. } => {
                error!("{}: {}", context, error);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, context);
            }
        };
        Self::new(status, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
            pagination: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

/// Attaches the handler's fallback message to a core result.
pub trait ResultExt<T> {
    fn or_respond(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for crate::errors::Result<T> {
    fn or_respond(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_error(e, context))
    }
}

/// Turns a missing row into a `404` envelope.
pub trait OptionExt<T> {
    fn or_not_found(self, entity: &'static str) -> Result<T, ApiError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, entity: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("{entity} not found")))
    }
}

/// Result type returned by every handler.
pub type ApiResult<T> = Result<Reply<T>, ApiError>;
