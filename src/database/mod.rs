// ABOUTME: Database management for the chat service
// ABOUTME: Wraps the SQLite pool and runs idempotent startup migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! # Database Management
//!
//! This module provides the storage layer for the chat subsystem: the
//! participant directory, the conversation registry and the message store.
//! Schema is created idempotently at startup; concurrency control is
//! delegated to SQLite transactions.

mod chat;
mod users;

pub use chat::{
    ChatManager, DEFAULT_CHAT_LIST_LIMIT, DEFAULT_HISTORY_LIMIT, MAX_MESSAGE_LENGTH,
};

use crate::errors::{AppError, AppResult};
use sqlx::{Pool, Sqlite, SqlitePool};
use uuid::Uuid;

/// Database manager for participants, conversations and messages
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot connect or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        ensure_sqlite_parent_dir(database_url)?;

        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains(":memory:")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the underlying pool
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a schema statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_chat().await?;
        Ok(())
    }
}

/// Create the parent directory of a file-backed SQLite database.
///
/// `mode=rwc` creates the database file but not its directory, so a
/// default like `sqlite:./data/workchat.db` would otherwise fail on a
/// fresh checkout.
fn ensure_sqlite_parent_dir(database_url: &str) -> AppResult<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.strip_prefix("//").unwrap_or(path);
    if path.contains(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::database(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}

/// Format a timestamp for TEXT storage.
///
/// Fixed-width microsecond precision keeps lexicographic order equal to
/// chronological order, which the message ordering queries rely on.
pub(crate) fn format_timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse a stored TEXT uuid column value
pub(crate) fn parse_uuid(value: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("Corrupt uuid in column {column}: {e}")))
}
