//! Shared test utilities for `canteen-pay`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test users, children, canteens and products with sensible defaults.

use crate::{
    core::{
        canteen::{NewCanteen, create_canteen},
        child::{NewChild, create_child},
        product::{NewProduct, create_product},
        role::seed_default_roles,
        user::{CreatedUser, NewUser, create_user},
        wallet::{FundsRequest, fund_wallet},
    },
    entities,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;

/// Password used by every test user.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Creates an in-memory `SQLite` database with all tables initialized and roles seeded.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    seed_default_roles(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Signup input for a parent with the given email.
pub fn new_user_input(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: TEST_PASSWORD.to_string(),
        name: None,
        first_name: None,
        last_name: None,
        phone: None,
        role: None,
    }
}

/// Signs up a parent. The result carries their wallet and API key.
pub async fn create_test_parent(db: &DatabaseConnection, email: &str) -> Result<CreatedUser> {
    create_user(db, new_user_input(email)).await
}

/// Signs up a canteen manager.
pub async fn create_test_manager(db: &DatabaseConnection, email: &str) -> Result<CreatedUser> {
    let mut input = new_user_input(email);
    input.role = Some("CANTEEN_MANAGER".to_string());
    create_user(db, input).await
}

/// Ids of a parent whose wallet has been funded.
#[derive(Debug, Clone, Copy)]
pub struct FundedParent {
    pub user_id: i64,
    pub wallet_id: i64,
}

/// Signs up a parent and deposits `amount` into their wallet (nothing when zero).
pub async fn create_funded_parent(
    db: &DatabaseConnection,
    email: &str,
    amount: f64,
) -> Result<FundedParent> {
    let parent = create_test_parent(db, email).await?;
    let wallet = parent.wallet.ok_or_else(|| Error::not_found("Wallet", parent.user.id))?;
    if amount > 0.0 {
        fund_wallet(
            db,
            wallet.id,
            FundsRequest {
                amount,
                description: None,
                reference: None,
            },
        )
        .await?;
    }
    Ok(FundedParent {
        user_id: parent.user.id,
        wallet_id: wallet.id,
    })
}

/// Creates an active child in "Primary 3" with an empty card.
pub async fn create_test_child(
    db: &DatabaseConnection,
    parent_id: i64,
    name: &str,
) -> Result<entities::child_profile::Model> {
    create_child(
        db,
        NewChild {
            name: name.to_string(),
            class: "Primary 3".to_string(),
            parent_id,
            is_active: None,
        },
    )
    .await
}

/// Registers "Main Canteen" for the given manager.
pub async fn create_test_canteen(
    db: &DatabaseConnection,
    manager_id: i64,
) -> Result<entities::canteen::Model> {
    create_canteen(
        db,
        manager_id,
        NewCanteen {
            name: "Main Canteen".to_string(),
            location: None,
        },
    )
    .await
}

/// Adds an available product to a canteen.
pub async fn create_test_product(
    db: &DatabaseConnection,
    canteen_id: i64,
    name: &str,
    price: f64,
) -> Result<entities::product::Model> {
    create_product(
        db,
        canteen_id,
        NewProduct {
            name: name.to_string(),
            price,
        },
    )
    .await
}

/// Sets up a test database with a canteen manager and their canteen.
pub async fn setup_with_canteen() -> Result<(DatabaseConnection, entities::canteen::Model)> {
    let db = setup_test_db().await?;
    let manager = create_test_manager(&db, "manager@school.edu").await?;
    let canteen = create_test_canteen(&db, manager.user.id).await?;
    Ok((db, canteen))
}
