use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Every failure the service can produce.
///
/// Domain variants (`NotFound`, `Validation`, `InsufficientFunds`, ...) carry a message
/// that is safe to show to API clients. Infrastructure variants are logged and replaced
/// with a fixed message at the HTTP boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Insufficient funds: balance is {current:.2}, {required:.2} required")]
    InsufficientFunds { current: f64, required: f64 },

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Password hashing failed: {message}")]
    PasswordHash { message: String },
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Turns a unique-constraint violation into `Conflict`; other failures stay `Database`.
    pub(crate) fn conflict_on_duplicate(error: DbErr, message: &str) -> Self {
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict {
                message: message.to_string(),
            },
            _ => Self::Database(error),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
