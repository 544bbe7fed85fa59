//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction when several calls must be atomic,
//! and pass `&mut tx` through without any other changes.
//!
//! Statements with a `RETURNING` clause are read with `fetch_all`, even when they return a single row. SQLite only
//! finishes a write statement (and releases its lock) once it has been stepped to the end.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod settings;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/kitchen.db";

pub fn db_url() -> String {
    let result = env::var("KITCHEN_DATABASE_URL").unwrap_or_else(|_| {
        info!("KITCHEN_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a connection pool in WAL mode, so that readers never block on the writer, with a busy timeout so that
/// competing writers queue up instead of failing straight away.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
