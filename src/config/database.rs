//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`, so the
//! schema always matches the Rust structs without hand-written SQL.

use crate::entities::{ApiKey, Canteen, ChildProfile, Product, Role, Transaction, User, Wallet};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Fallback used when neither `DATABASE_URL` nor config.toml name a database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen_pay.sqlite?mode=rwc";

/// Gets the database URL from the environment, then the configured value, then the default.
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        configured
            .map_or_else(|| DEFAULT_DATABASE_URL.to_string(), ToString::to_string)
    })
}

/// Directory that must exist before `SQLite` can create the file named by `database_url`.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` the containing directory is created first.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Tables are created parents-first so foreign keys always point at an existing table.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(Role),
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(ApiKey),
        schema.create_table_from_entity(Wallet),
        schema.create_table_from_entity(ChildProfile),
        schema.create_table_from_entity(Canteen),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Transaction),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}
