//! Core business logic - framework-agnostic operations over the database.
//!
//! Every function takes a `SeaORM` connection (or transaction) and returns the crate
//! [`Result`](crate::errors::Result); the HTTP layer only translates inputs and outputs.

pub mod api_key;
pub mod canteen;
pub mod child;
pub mod pagination;
pub mod product;
pub mod role;
pub mod transaction;
pub mod user;
pub mod wallet;

use crate::errors::{Error, Result};

/// Rejects amounts that cannot move money: zero, negative, NaN and infinities.
pub(crate) fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.01).is_ok());
        assert!(validate_amount(1_000_000.0).is_ok());

        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                validate_amount(amount),
                Err(Error::InvalidAmount { amount: _ })
            ));
        }
    }
}
