// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! Environment-based configuration management for production deployment

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Default HTTP port when `HTTP_PORT` is unset
const DEFAULT_HTTP_PORT: u16 = 8081;
/// Default SQLite database URL when `DATABASE_URL` is unset
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/workchat.db";
/// Default JWT token expiry in hours
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 JWT validation
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
}

/// Top-level server configuration, loaded from environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the unified HTTP + WebSocket server listens on
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Allowed CORS origin for browser clients (`*` when unset)
    pub cors_origin: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a present variable fails to parse (e.g. a
    /// non-numeric `HTTP_PORT`) or if `JWT_SECRET` is missing outside
    /// development.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("invalid HTTP_PORT value {value}: {e}")))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_owned());
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "production" => {
                return Err(AppError::config("JWT_SECRET must be set in production"));
            }
            // Development fallback; never used outside local runs
            Err(_) => "workchat-dev-secret".to_owned(),
        };

        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(value) => value.parse::<i64>().map_err(|e| {
                AppError::config(format!("invalid JWT_EXPIRY_HOURS value {value}: {e}"))
            })?,
            Err(_) => DEFAULT_JWT_EXPIRY_HOURS,
        };

        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_owned());

        Ok(Self {
            http_port,
            database: DatabaseConfig { url: database_url },
            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_hours,
            },
            cors_origin,
        })
    }

    /// One-line configuration summary for startup logging (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} jwt_expiry_hours={} cors_origin={}",
            self.http_port, self.database.url, self.auth.jwt_expiry_hours, self.cors_origin
        )
    }
}
