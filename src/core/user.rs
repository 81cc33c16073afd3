//! User business logic - Signup, lookup, listing and removal of users.
//!
//! Signup is the only unauthenticated write in the service: it creates the user, issues a
//! default API key and, for parents, opens an empty wallet, all in one database transaction.

use crate::{
    core::{
        api_key::{DEFAULT_KEY_NAME, create_api_key},
        pagination::{Page, PageRequest, Pagination},
        role::{RoleName, get_role_by_name, role_name_of},
    },
    entities::{User, Wallet, user, wallet},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use rand::rngs::OsRng;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

const DUPLICATE_EMAIL: &str =
    "User already exists in the database, try signing up using a different account/email";

/// Input for [`create_user`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Role name; `PARENT` when absent
    pub role: Option<String>,
}

/// Result of a successful signup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    #[serde(flatten)]
    pub user: user::Model,
    pub role: String,
    /// Key to send in `x-api-key`
    pub api_key: String,
    /// Present for parents only
    pub wallet: Option<wallet::Model>,
}

/// A user together with their wallet, if they have one.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithWallet {
    #[serde(flatten)]
    pub user: user::Model,
    pub wallet: Option<wallet::Model>,
}

/// Hashes a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

fn display_name(new_user: &NewUser, email: &str) -> String {
    if let Some(name) = new_user.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    let parts: Vec<&str> = [new_user.first_name.as_deref(), new_user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        parts.join(" ")
    }
}

/// Signs up a new user.
///
/// # Errors
/// - `Validation` for a malformed email, a short password or an unknown role
/// - `Conflict` when the email is already registered
/// - `NotFound` when the role has not been seeded
#[instrument(skip(db, new_user), fields(email = %new_user.email))]
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<CreatedUser> {
    let email = new_user.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation("A valid email address is required"));
    }
    if new_user.password.len() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role_name = match new_user.role.as_deref() {
        Some(role) => role.parse::<RoleName>()?,
        None => RoleName::Parent,
    };

    let existing = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict {
            message: DUPLICATE_EMAIL.to_string(),
        });
    }

    let role = get_role_by_name(db, role_name)
        .await?
        .ok_or_else(|| Error::not_found("Role", role_name))?;
    let password_hash = hash_password(&new_user.password)?;
    let now = chrono::Utc::now();

    let txn = db.begin().await?;

    let user = user::ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        name: Set(display_name(&new_user, &email)),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        phone: Set(new_user.phone),
        role_id: Set(role.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| Error::conflict_on_duplicate(e, DUPLICATE_EMAIL))?;

    let api_key = create_api_key(&txn, user.id, DEFAULT_KEY_NAME).await?;

    let wallet = if role_name == RoleName::Parent {
        Some(crate::core::wallet::open_wallet(&txn, user.id).await?)
    } else {
        None
    };

    txn.commit().await?;
    info!("Created user {} with role {}", user.id, role_name);

    Ok(CreatedUser {
        user,
        role: role_name.to_string(),
        api_key: api_key.key,
        wallet,
    })
}

/// Lists users newest first, optionally filtered by a case-insensitive search on name or email.
pub async fn list_users(
    db: &DatabaseConnection,
    search: Option<&str>,
    request: PageRequest,
) -> Result<Page<UserWithWallet>> {
    let mut query = User::find();
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(user::Column::Name.contains(term))
                .add(user::Column::Email.contains(term)),
        );
    }

    let paginator = query
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .find_also_related(Wallet)
        .paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(request.index())
        .await?
        .into_iter()
        .map(|(user, wallet)| UserWithWallet { user, wallet })
        .collect();

    Ok(Page {
        items,
        pagination: Pagination::new(request, total),
    })
}

/// Finds a user by id.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by id together with the name of their role.
pub async fn get_user_with_role<C>(db: &C, user_id: i64) -> Result<Option<(user::Model, RoleName)>>
where
    C: ConnectionTrait,
{
    let Some(user) = get_user_by_id(db, user_id).await? else {
        return Ok(None);
    };
    let role = role_name_of(db, user.role_id)
        .await?
        .ok_or_else(|| Error::not_found("Role", user.role_id))?;
    Ok(Some((user, role)))
}

/// Deletes a user. Wallet, child profiles and API keys go with it.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let result = User::delete_by_id(user_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("User", user_id));
    }
    info!("Deleted user {}", user_id);
    Ok(())
}
