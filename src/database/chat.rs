// ABOUTME: Database operations for conversations and messages
// ABOUTME: Implements the conversation registry and the append-only message store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use super::{format_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Conversation, ConversationSummary, Message, UserProfile, UserRole};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Maximum accepted message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Default page size for message history
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Default page size for the conversation list
pub const DEFAULT_CHAT_LIST_LIMIT: i64 = 50;

/// Chat database operations: conversation registry and message store
#[derive(Clone)]
pub struct ChatManager {
    pool: SqlitePool,
}

impl Database {
    /// Create the conversation and message tables
    pub(super) async fn migrate_chat(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                job_id TEXT,
                employer_id TEXT NOT NULL,
                seeker_id TEXT NOT NULL,
                last_message_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (job_id, employer_id, seeker_id)
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversations table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                content TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages table: {e}")))?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id, created_at)
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create message index: {e}")))?;

        Ok(())
    }

    /// Create a `ChatManager` sharing this database's pool
    #[must_use]
    pub fn chat(&self) -> ChatManager {
        ChatManager::new(self.pool().clone())
    }
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Registry
    // ========================================================================

    /// Look up or create the single conversation for a (job, employer,
    /// seeker) triple.
    ///
    /// Race-safe: concurrent callers converge on one row via the UNIQUE
    /// constraint; the conflicting insert is a no-op and both callers read
    /// back the same conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable
    pub async fn get_or_create_conversation(
        &self,
        job_id: Uuid,
        employer_id: Uuid,
        seeker_id: Uuid,
    ) -> AppResult<Conversation> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO conversations (id, job_id, employer_id, seeker_id, last_message_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (job_id, employer_id, seeker_id) DO NOTHING
            ",
        )
        .bind(id.to_string())
        .bind(job_id.to_string())
        .bind(employer_id.to_string())
        .bind(seeker_id.to_string())
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        let row = sqlx::query(
            r"
            SELECT id, job_id, employer_id, seeker_id, last_message_at, created_at
            FROM conversations
            WHERE job_id = $1 AND employer_id = $2 AND seeker_id = $3
            ",
        )
        .bind(job_id.to_string())
        .bind(employer_id.to_string())
        .bind(seeker_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read back conversation: {e}")))?;

        conversation_from_row(&row)
    }

    /// Get a conversation by id
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    pub async fn get_conversation(&self, conversation_id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            r"
            SELECT id, job_id, employer_id, seeker_id, last_message_at, created_at
            FROM conversations
            WHERE id = $1
            ",
        )
        .bind(conversation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.map(|r| conversation_from_row(&r)).transpose()
    }

    /// List a participant's conversations, most recently active first
    ///
    /// Each summary carries the counterpart's profile and the latest
    /// message when one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a read fails
    pub async fn list_conversations_for(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.job_id, c.last_message_at,
                   u.id AS cp_id, u.display_name AS cp_name,
                   u.avatar_url AS cp_avatar, u.role AS cp_role
            FROM conversations c
            JOIN users u
              ON u.id = CASE WHEN c.employer_id = $1 THEN c.seeker_id ELSE c.employer_id END
            WHERE c.employer_id = $1 OR c.seeker_id = $1
            ORDER BY c.last_message_at DESC, c.rowid DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let id_text: String = row.get("id");
            let conversation_id = parse_uuid(&id_text, "conversations.id")?;
            let job_id: Option<String> = row.get("job_id");
            let cp_id: String = row.get("cp_id");
            let cp_role: String = row.get("cp_role");

            let counterpart = UserProfile {
                id: parse_uuid(&cp_id, "users.id")?,
                display_name: row.get("cp_name"),
                avatar_url: row.get("cp_avatar"),
                role: UserRole::from_str_opt(&cp_role)
                    .ok_or_else(|| AppError::database(format!("Unknown user role: {cp_role}")))?,
            };

            let last_message = self.latest_message(conversation_id).await?;
            let last_message_at: String = row.get("last_message_at");

            summaries.push(ConversationSummary {
                id: conversation_id,
                job_id: job_id
                    .as_deref()
                    .map(|j| parse_uuid(j, "conversations.job_id"))
                    .transpose()?,
                counterpart,
                last_message,
                last_message_at: parse_timestamp(&last_message_at)?,
            });
        }

        Ok(summaries)
    }

    // ========================================================================
    // Message Store
    // ========================================================================

    /// Append a message and advance the conversation's recency marker in
    /// one transaction.
    ///
    /// The returned message carries the sender's resolved display fields so
    /// it can be broadcast without a second lookup.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty or oversized content,
    /// `ResourceNotFound` for an unknown conversation or sender, and a
    /// database error if a write fails
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::invalid_input("Message content must not be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Message content exceeds {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let sender = sqlx::query(
            r"
            SELECT display_name, avatar_url FROM users WHERE id = $1
            ",
        )
        .bind(sender_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to resolve sender: {e}")))?
        .ok_or_else(|| AppError::not_found("Sender"))?;

        let sender_name: String = sender.get("display_name");
        let sender_avatar: Option<String> = sender.get("avatar_url");

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, sender_id, content, is_read, created_at)
            VALUES ($1, $2, $3, $4, 0, $5)
            ",
        )
        .bind(id.to_string())
        .bind(conversation_id.to_string())
        .bind(sender_id.to_string())
        .bind(content)
        .bind(format_timestamp(now))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert message: {e}")))?;

        let touched = sqlx::query(
            r"
            UPDATE conversations SET last_message_at = $1 WHERE id = $2
            ",
        )
        .bind(format_timestamp(now))
        .bind(conversation_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update recency marker: {e}")))?;

        if touched.rows_affected() == 0 {
            // Rolls back the message insert as well
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Err(AppError::not_found("Conversation"));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit message: {e}")))?;

        Ok(Message {
            id,
            conversation_id,
            sender_id,
            sender_name,
            sender_avatar,
            content: content.to_owned(),
            is_read: false,
            created_at: now,
        })
    }

    /// List a page of messages, oldest first.
    ///
    /// Without a cursor the page holds the `limit` most recent messages;
    /// with `before` it holds messages strictly older than that message.
    /// Paging backwards from the tail therefore walks the full history.
    ///
    /// # Errors
    ///
    /// Returns an error if a read fails or the cursor is unknown
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        before: Option<Uuid>,
    ) -> AppResult<Vec<Message>> {
        let rows = if let Some(cursor_id) = before {
            let cursor = sqlx::query(
                r"
                SELECT created_at, rowid FROM messages WHERE id = $1 AND conversation_id = $2
                ",
            )
            .bind(cursor_id.to_string())
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to resolve cursor: {e}")))?
            .ok_or_else(|| AppError::not_found("Cursor message"))?;

            let cursor_created_at: String = cursor.get("created_at");
            let cursor_rowid: i64 = cursor.get("rowid");

            sqlx::query(
                r"
                SELECT m.id, m.conversation_id, m.sender_id, m.content, m.is_read, m.created_at,
                       u.display_name AS sender_name, u.avatar_url AS sender_avatar
                FROM messages m
                JOIN users u ON u.id = m.sender_id
                WHERE m.conversation_id = $1
                  AND (m.created_at < $2 OR (m.created_at = $2 AND m.rowid < $3))
                ORDER BY m.created_at DESC, m.rowid DESC
                LIMIT $4
                ",
            )
            .bind(conversation_id.to_string())
            .bind(cursor_created_at)
            .bind(cursor_rowid)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?
        } else {
            sqlx::query(
                r"
                SELECT m.id, m.conversation_id, m.sender_id, m.content, m.is_read, m.created_at,
                       u.display_name AS sender_name, u.avatar_url AS sender_avatar
                FROM messages m
                JOIN users u ON u.id = m.sender_id
                WHERE m.conversation_id = $1
                ORDER BY m.created_at DESC, m.rowid DESC
                LIMIT $2
                ",
            )
            .bind(conversation_id.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?
        };

        // Rows arrive newest-first; render order is oldest-first
        let mut messages = rows
            .iter()
            .map(message_from_row)
            .collect::<AppResult<Vec<Message>>>()?;
        messages.reverse();

        Ok(messages)
    }

    /// The most recent message of a conversation, if any
    async fn latest_message(&self, conversation_id: Uuid) -> AppResult<Option<Message>> {
        let row = sqlx::query(
            r"
            SELECT m.id, m.conversation_id, m.sender_id, m.content, m.is_read, m.created_at,
                   u.display_name AS sender_name, u.avatar_url AS sender_avatar
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.conversation_id = $1
            ORDER BY m.created_at DESC, m.rowid DESC
            LIMIT 1
            ",
        )
        .bind(conversation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get latest message: {e}")))?;

        row.as_ref().map(message_from_row).transpose()
    }
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Corrupt timestamp: {e}")))
}

fn conversation_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<Conversation> {
    let id: String = row.get("id");
    let job_id: Option<String> = row.get("job_id");
    let employer_id: String = row.get("employer_id");
    let seeker_id: String = row.get("seeker_id");
    let last_message_at: String = row.get("last_message_at");
    let created_at: String = row.get("created_at");

    Ok(Conversation {
        id: parse_uuid(&id, "conversations.id")?,
        job_id: job_id
            .as_deref()
            .map(|j| parse_uuid(j, "conversations.job_id"))
            .transpose()?,
        employer_id: parse_uuid(&employer_id, "conversations.employer_id")?,
        seeker_id: parse_uuid(&seeker_id, "conversations.seeker_id")?,
        last_message_at: parse_timestamp(&last_message_at)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<Message> {
    let id: String = row.get("id");
    let conversation_id: String = row.get("conversation_id");
    let sender_id: String = row.get("sender_id");
    let is_read: i64 = row.get("is_read");
    let created_at: String = row.get("created_at");

    Ok(Message {
        id: parse_uuid(&id, "messages.id")?,
        conversation_id: parse_uuid(&conversation_id, "messages.conversation_id")?,
        sender_id: parse_uuid(&sender_id, "messages.sender_id")?,
        sender_name: row.get("sender_name"),
        sender_avatar: row.get("sender_avatar"),
        content: row.get("content"),
        is_read: is_read != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}
