//! Database configuration module for the production ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{FinalProduct, InventoryItem, Subproduct, SubproductIngredient};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::debug;

/// Default location of the `SQLite` file when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/production.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or the default path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
///
/// # Errors
/// Returns [`Error::Io`](crate::Error::Io) if the database directory cannot be created and
/// [`Error::Database`](crate::Error::Database) if the connection fails.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates all tables if they do not exist yet.
///
/// Parents are created before children so foreign keys resolve on every backend.
///
/// # Errors
/// Returns [`Error::Database`](crate::Error::Database) if a table cannot be created.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, InventoryItem).await?;
    create_table(db, Subproduct).await?;
    create_table(db, SubproductIngredient).await?;
    create_table(db, FinalProduct).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}
