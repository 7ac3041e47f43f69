// ABOUTME: Authentication boundary to the external identity service
// ABOUTME: Validates HS256 JWTs and extracts the authenticated participant identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! JWT validation for the chat service
//!
//! Identity issuance lives in the platform's auth service; this module only
//! validates the tokens it mints. `generate_token` mirrors the issuer's
//! contract and exists for tests and local development.

use crate::errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `JWT` claims for participant authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Participant id
    pub sub: String,
    /// Display name snapshot at issuance
    pub name: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Result of a successful token validation
#[derive(Debug, Clone, Copy)]
pub struct AuthResult {
    /// Authenticated participant id
    pub user_id: Uuid,
}

/// Authentication manager holding the shared HS256 secret
#[derive(Clone)]
pub struct AuthManager {
    secret: Vec<u8>,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(secret: Vec<u8>, token_expiry_hours: i64) -> Self {
        Self {
            secret,
            token_expiry_hours,
        }
    }

    /// Generate a `JWT` for a participant (issuer contract; used by tests)
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, user_id: Uuid, display_name: &str) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            name: display_name.to_owned(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
    }

    /// Validate a token and return the authenticated identity
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the signature is wrong, the token is
    /// expired or malformed, or the subject is not a UUID
    pub fn validate_token(&self, token: &str) -> AppResult<AuthResult> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|e| AppError::auth_invalid(format!("JWT validation failed: {e}")))?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AppError::auth_invalid(format!("JWT subject is not a UUID: {e}")))?;

        Ok(AuthResult { user_id })
    }

    /// Validate a bearer header value (`Bearer <token>` or a bare token)
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the header is absent, otherwise as
    /// [`Self::validate_token`]
    pub fn authenticate_header(&self, header: Option<&str>) -> AppResult<AuthResult> {
        let header = header.ok_or_else(AppError::auth_required)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        self.validate_token(token)
    }
}
