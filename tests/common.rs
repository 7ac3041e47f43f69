// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, resource and participant creation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Shared test utilities for `workchat`
//!
//! Common setup functions to reduce duplication across integration tests.

use anyhow::Result;
use std::sync::{Arc, Once};
use uuid::Uuid;
use workchat::{
    config::ServerConfig,
    database::Database,
    models::{UserProfile, UserRole},
    resources::ServerResources,
};

static INIT_LOGGER: Once = Once::new();

/// JWT secret used by every test server
pub const TEST_JWT_SECRET: &str = "workchat-test-secret";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// On-disk test database backed by a temp directory.
///
/// A file-backed database is used instead of `sqlite::memory:` so every
/// pooled connection sees the same data.
pub struct TestDatabase {
    pub database: Database,
    _temp_dir: tempfile::TempDir,
}

/// Standard test database setup
pub async fn create_test_database() -> Result<TestDatabase> {
    init_test_logging();
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("workchat-test.db");
    let database = Database::new(&format!("sqlite:{}", db_path.display())).await?;
    Ok(TestDatabase {
        database,
        _temp_dir: temp_dir,
    })
}

/// Server configuration for tests
pub fn test_config(http_port: u16, database_url: &str) -> ServerConfig {
    ServerConfig {
        http_port,
        database: workchat::config::environment::DatabaseConfig {
            url: database_url.to_owned(),
        },
        auth: workchat::config::environment::AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
            jwt_expiry_hours: 24,
        },
        cors_origin: "*".to_owned(),
    }
}

/// Build the full resource container over a fresh test database
pub async fn create_test_resources() -> Result<(Arc<ServerResources>, tempfile::TempDir)> {
    init_test_logging();
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("workchat-test.db");
    let url = format!("sqlite:{}", db_path.display());
    let database = Database::new(&url).await?;
    let resources = Arc::new(ServerResources::new(database, test_config(0, &url)));
    Ok((resources, temp_dir))
}

/// Create a test participant with the given role
pub async fn create_test_user(
    database: &Database,
    display_name: &str,
    role: UserRole,
) -> Result<UserProfile> {
    let profile = UserProfile {
        id: Uuid::new_v4(),
        display_name: display_name.to_owned(),
        avatar_url: None,
        role,
    };
    database.upsert_user(&profile).await?;
    Ok(profile)
}

/// Issue a JWT for a test user through the server's own auth manager
pub fn bearer_token(resources: &ServerResources, user: &UserProfile) -> String {
    let token = resources
        .auth_manager
        .generate_token(user.id, &user.display_name)
        .expect("Failed to generate test token");
    format!("Bearer {token}")
}
