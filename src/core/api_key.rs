//! API key business logic - Generation and validation of `x-api-key` credentials.

use crate::{
    entities::{ApiKey, api_key},
    errors::Result,
};
use rand::RngCore;
use rand::rngs::OsRng;
use sea_orm::{Set, prelude::*};
use std::fmt::Write;

/// Prefix shared by every issued key.
pub const API_KEY_PREFIX: &str = "sk_live_";

/// Name given to the key issued at signup.
pub const DEFAULT_KEY_NAME: &str = "Default Key";

/// Generates a new key: the prefix followed by 32 random bytes as lowercase hex.
#[must_use]
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);

    let mut key = String::with_capacity(API_KEY_PREFIX.len() + bytes.len() * 2);
    key.push_str(API_KEY_PREFIX);
    for byte in bytes {
        // Writing to a String cannot fail
        let _ = write!(key, "{byte:02x}");
    }
    key
}

/// Issues a new key for `user_id`.
pub async fn create_api_key<C>(db: &C, user_id: i64, name: &str) -> Result<api_key::Model>
where
    C: ConnectionTrait,
{
    let model = api_key::ActiveModel {
        name: Set(name.to_string()),
        key: Set(generate_api_key()),
        user_id: Set(user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Looks up a presented key. Returns `None` when the key was never issued.
pub async fn validate_api_key(db: &DatabaseConnection, key: &str) -> Result<Option<api_key::Model>> {
    ApiKey::find()
        .filter(api_key::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}
