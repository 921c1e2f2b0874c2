#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Relational store adapter for the salescraft platform.
//!
//! Provides schema bootstrap and typed CRUD for agents, products,
//! conversations, training rows, and orders over `switchy_database`
//! (`SQLite` by default, path taken from `STORE_URL`). Contracts:
//!
//! - Reads that miss return `Ok(None)` (or `Ok(false)` for
//!   update/delete), never an error.
//! - Writes are single-row and durable on return.
//! - Lists filtered by `agent_id` walk an index on that column.
//! - Every operation is bounded by a 10 s wall-clock ceiling; an
//!   exceeded ceiling surfaces as [`StoreError::Timeout`], the store's
//!   transient kind.
//!
//! Nested structures (transcripts, lead info, order items, product
//! features/specifications) are stored as JSON text columns; scalar
//! columns carry everything the store filters or sorts on.

pub mod agents;
pub mod conversations;
pub mod orders;
pub mod products;
pub mod training;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use switchy_database::{Database, DatabaseValue, Row};
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Per-operation wall-clock ceiling for store calls.
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The store did not answer within the per-operation ceiling.
    /// Transient: safe to retry.
    #[error("Store operation timed out")]
    Timeout,

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization of a nested column failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A status update violated the entity's transition rules.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Rejected target status.
        to: String,
    },
}

/// Runs a parameterized statement under the store timeout.
pub(crate) async fn exec(
    db: &dyn Database,
    sql: &str,
    params: &[DatabaseValue],
) -> Result<u64, StoreError> {
    tokio::time::timeout(STORE_TIMEOUT, db.exec_raw_params(sql, params))
        .await
        .map_err(|_| StoreError::Timeout)?
        .map_err(|e| StoreError::Database(e.to_string()))
}

/// Runs a parameterized query under the store timeout.
pub(crate) async fn query(
    db: &dyn Database,
    sql: &str,
    params: &[DatabaseValue],
) -> Result<Vec<Row>, StoreError> {
    tokio::time::timeout(STORE_TIMEOUT, db.query_raw_params(sql, params))
        .await
        .map_err(|_| StoreError::Timeout)?
        .map_err(|e| StoreError::Database(e.to_string()))
}

/// Runs a bare DDL statement under the store timeout.
async fn exec_ddl(db: &dyn Database, sql: &str) -> Result<(), StoreError> {
    tokio::time::timeout(STORE_TIMEOUT, db.exec_raw(sql))
        .await
        .map_err(|_| StoreError::Timeout)?
        .map_err(|e| StoreError::Database(e.to_string()))?;
    Ok(())
}

/// Opens (or creates) the salescraft `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`StoreError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Database(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables and indexes if they don't already exist.
///
/// # Errors
///
/// Returns [`StoreError`] if any DDL statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS agents (
            id                  TEXT PRIMARY KEY,
            owner_id            TEXT NOT NULL,
            name                TEXT NOT NULL,
            company_name        TEXT NOT NULL,
            company_description TEXT NOT NULL,
            tone                TEXT NOT NULL,
            language            TEXT NOT NULL,
            greeting_message    TEXT,
            sales_strategy      TEXT,
            products            TEXT NOT NULL,
            index_namespace     TEXT NOT NULL UNIQUE,
            is_active           INTEGER NOT NULL,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_agents_owner ON agents (owner_id)",
        "CREATE TABLE IF NOT EXISTS products (
            id                   TEXT PRIMARY KEY,
            agent_id             TEXT NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
            name                 TEXT NOT NULL,
            description          TEXT,
            detailed_description TEXT,
            price                REAL,
            currency             TEXT NOT NULL,
            image_url            TEXT,
            category             TEXT,
            features             TEXT NOT NULL,
            specifications       TEXT NOT NULL,
            stock_status         TEXT NOT NULL,
            sku                  TEXT,
            is_featured          INTEGER NOT NULL,
            is_active            INTEGER NOT NULL,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_products_agent ON products (agent_id)",
        "CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            agent_id    TEXT NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
            session_id  TEXT NOT NULL,
            channel     TEXT NOT NULL,
            messages    TEXT NOT NULL,
            lead_info   TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            UNIQUE(agent_id, session_id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_conversations_agent ON conversations (agent_id)",
        "CREATE INDEX IF NOT EXISTS idx_conversations_created ON conversations (created_at)",
        "CREATE TABLE IF NOT EXISTS training_data (
            id          TEXT PRIMARY KEY,
            agent_id    TEXT NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
            kind        TEXT NOT NULL,
            status      TEXT NOT NULL,
            metadata    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_training_agent ON training_data (agent_id)",
        "CREATE TABLE IF NOT EXISTS orders (
            id               TEXT PRIMARY KEY,
            agent_id         TEXT NOT NULL REFERENCES agents(id) ON DELETE CASCADE,
            session_id       TEXT,
            order_number     TEXT NOT NULL UNIQUE,
            customer_name    TEXT NOT NULL,
            customer_email   TEXT NOT NULL,
            customer_phone   TEXT,
            shipping_address TEXT,
            items            TEXT NOT NULL,
            total_amount     REAL NOT NULL,
            status           TEXT NOT NULL,
            status_history   TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_orders_agent ON orders (agent_id)",
        "CREATE TABLE IF NOT EXISTS order_sequences (
            year  INTEGER PRIMARY KEY,
            next  INTEGER NOT NULL
        )",
        // SQLite has foreign key enforcement off by default
        "PRAGMA foreign_keys = ON",
    ];

    for sql in statements {
        exec_ddl(db, sql).await?;
    }

    Ok(())
}

/// Parses an RFC 3339 timestamp column, falling back to the Unix epoch
/// for rows written by older builds.
#[must_use]
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_timestamps() {
        let ts = parse_timestamp("2026-02-01T10:30:00+00:00");
        assert_eq!(ts.to_rfc3339(), "2026-02-01T10:30:00+00:00");
    }

    #[test]
    fn falls_back_to_epoch_for_garbage() {
        assert_eq!(parse_timestamp("not-a-date"), DateTime::<Utc>::default());
    }
}
