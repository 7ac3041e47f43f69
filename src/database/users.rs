// ABOUTME: Participant directory mirrored from the platform identity service
// ABOUTME: Stores display fields and marketplace roles used to resolve senders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use super::{format_timestamp, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{UserProfile, UserRole};
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                avatar_url TEXT,
                role TEXT NOT NULL CHECK (role IN ('employer', 'seeker')),
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        Ok(())
    }

    /// Insert or refresh a participant profile
    ///
    /// The identity service owns these records; the chat service keeps a
    /// mirror so senders can be resolved without a cross-service call.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_user(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, display_name, avatar_url, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                role = excluded.role
            ",
        )
        .bind(profile.id.to_string())
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(profile.role.as_str())
        .bind(format_timestamp(Utc::now()))
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert user: {e}")))?;

        Ok(())
    }

    /// Look up a participant profile by id
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or a stored value is corrupt
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT id, display_name, avatar_url, role
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| {
            let id: String = r.get("id");
            let role: String = r.get("role");
            Ok(UserProfile {
                id: parse_uuid(&id, "users.id")?,
                display_name: r.get("display_name"),
                avatar_url: r.get("avatar_url"),
                role: UserRole::from_str_opt(&role)
                    .ok_or_else(|| AppError::database(format!("Unknown user role: {role}")))?,
            })
        })
        .transpose()
    }
}
