//! Database module
//!
//! This module provides all database functionality including:
//! - Schema and migrations
//! - Model definitions for products and their stored files
//! - Repository layer for CRUD operations

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::run_migrations;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the catalog database at `database_url` and bring its schema up to date.
///
/// The file is created on first use. Every connection runs in WAL mode with
/// foreign keys enforced, which the cascading record deletes depend on.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    tracing::info!("Opening database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Private in-memory database with the schema applied.
///
/// Each `:memory:` connection is its own empty database, so the pool holds
/// exactly one connection and never recycles it.
#[cfg(test)]
pub(crate) async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}
