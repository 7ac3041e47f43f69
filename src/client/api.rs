// ABOUTME: Typed HTTP client for the chat REST API
// ABOUTME: Wraps reqwest with bearer auth and response decoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use crate::errors::{AppError, AppResult};
use crate::models::Conversation;
use crate::routes::chat::{ChatListResponse, MessageListResponse};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// HTTP client for the chat REST endpoints
pub struct ChatApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ChatApiClient {
    /// Create a client for `base_url` authenticating with `token`
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Open (or fetch the existing) conversation for a job
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it
    pub async fn initiate_chat(
        &self,
        job_id: Uuid,
        other_participant_id: Uuid,
    ) -> AppResult<Conversation> {
        let response = self
            .http
            .post(format!("{}/api/chat/initiate", self.base_url))
            .bearer_auth(&self.token)
            .json(&InitiateChatRequestBody {
                job_id,
                other_participant_id,
            })
            .send()
            .await
            .map_err(|e| AppError::external_service("workchat-api", format!("Request failed: {e}")))?;

        decode(response).await
    }

    /// Fetch the caller's conversation list
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it
    pub async fn my_chats(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<ChatListResponse> {
        let mut request = self
            .http
            .get(format!("{}/api/chat/my-chats", self.base_url))
            .bearer_auth(&self.token);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external_service("workchat-api", format!("Request failed: {e}")))?;

        decode(response).await
    }

    /// Fetch a page of message history
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it
    pub async fn messages(
        &self,
        conversation_id: Uuid,
        limit: Option<i64>,
        before: Option<Uuid>,
    ) -> AppResult<MessageListResponse> {
        let mut request = self
            .http
            .get(format!(
                "{}/api/chat/{conversation_id}/messages",
                self.base_url
            ))
            .bearer_auth(&self.token);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        if let Some(before) = before {
            request = request.query(&[("before", before.to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external_service("workchat-api", format!("Request failed: {e}")))?;

        decode(response).await
    }
}

// Serializable mirror of the route's request body
#[derive(serde::Serialize)]
struct InitiateChatRequestBody {
    job_id: Uuid,
    other_participant_id: Uuid,
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::external_service(
            "workchat-api",
            format!("Server returned {status}: {body}"),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AppError::external_service("workchat-api", format!("Invalid response body: {e}")))
}
