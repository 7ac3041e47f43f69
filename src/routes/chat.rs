// ABOUTME: Chat route handlers for conversations between employers and seekers
// ABOUTME: Provides REST endpoints for initiating chats, listing them and paging history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! Chat routes
//!
//! This module handles conversation initiation, the caller's chat list and
//! message history pages. All handlers require JWT authentication; history
//! access is restricted to conversation participants.

use crate::{
    database::{DEFAULT_CHAT_LIST_LIMIT, DEFAULT_HISTORY_LIMIT},
    errors::AppError,
    models::{Conversation, ConversationSummary, Message},
    resources::ServerResources,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to open a conversation about a job
#[derive(Debug, Deserialize)]
pub struct InitiateChatRequest {
    /// Job posting the conversation is about
    pub job_id: Uuid,
    /// The user on the other side of the conversation
    pub other_participant_id: Uuid,
}

/// Response for listing the caller's conversations
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatListResponse {
    /// Recency-ordered conversation summaries
    pub conversations: Vec<ConversationSummary>,
    /// Number of summaries in this page
    pub total: usize,
}

/// Response for a message history page
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    /// Messages in oldest-first render order
    pub messages: Vec<Message>,
    /// Number of messages in this page
    pub total: usize,
}

/// Query parameters for listing conversations
#[derive(Debug, Deserialize)]
pub struct ChatListQuery {
    /// Maximum summaries to return
    pub limit: Option<i64>,
    /// Summaries to skip
    pub offset: Option<i64>,
}

/// Query parameters for paging message history
#[derive(Debug, Deserialize)]
pub struct MessageHistoryQuery {
    /// Maximum messages to return
    pub limit: Option<i64>,
    /// Return only messages older than this message id
    pub before: Option<Uuid>,
}

// ============================================================================
// Routes
// ============================================================================

/// Chat routes implementation
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/initiate", post(Self::initiate_chat))
            .route("/api/chat/my-chats", get(Self::list_my_chats))
            .route(
                "/api/chat/:conversation_id/messages",
                get(Self::get_messages),
            )
            .with_state(resources)
    }

    /// Extract and authenticate the caller from the authorization header
    fn authenticate(
        headers: &axum::http::HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<crate::auth::AuthResult, AppError> {
        let auth_header = headers.get("authorization").and_then(|h| h.to_str().ok());
        resources.auth_manager.authenticate_header(auth_header)
    }

    /// Open (or return the existing) conversation for a job between the
    /// caller and another participant
    async fn initiate_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
        Json(request): Json<InitiateChatRequest>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;

        if request.other_participant_id == auth.user_id {
            return Err(AppError::invalid_input(
                "Cannot open a conversation with yourself",
            ));
        }

        let caller = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let other = resources
            .database
            .get_user(request.other_participant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Other participant"))?;

        // Sides are resolved from directory roles, not request field order
        let (employer_id, seeker_id) = match (caller.role, other.role) {
            (crate::models::UserRole::Employer, crate::models::UserRole::Seeker) => {
                (caller.id, other.id)
            }
            (crate::models::UserRole::Seeker, crate::models::UserRole::Employer) => {
                (other.id, caller.id)
            }
            _ => {
                return Err(AppError::invalid_input(
                    "A conversation requires one employer and one seeker",
                ));
            }
        };

        let conversation: Conversation = resources
            .chat
            .get_or_create_conversation(request.job_id, employer_id, seeker_id)
            .await?;

        info!(
            "Conversation {} ready for job {} between {} and {}",
            conversation.id, request.job_id, employer_id, seeker_id
        );

        Ok((StatusCode::OK, Json(conversation)).into_response())
    }

    /// List the caller's conversations, most recently active first
    async fn list_my_chats(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
        Query(query): Query<ChatListQuery>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;

        let limit = query
            .limit
            .unwrap_or(DEFAULT_CHAT_LIST_LIMIT)
            .clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let conversations = resources
            .chat
            .list_conversations_for(auth.user_id, limit, offset)
            .await?;

        let total = conversations.len();
        let response = ChatListResponse {
            conversations,
            total,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Get a page of message history for a conversation
    async fn get_messages(
        State(resources): State<Arc<ServerResources>>,
        headers: axum::http::HeaderMap,
        Path(conversation_id): Path<Uuid>,
        Query(query): Query<MessageHistoryQuery>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;

        let conversation = resources
            .chat
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if !conversation.has_participant(auth.user_id) {
            return Err(AppError::forbidden(
                "User is not a participant in this conversation",
            ));
        }

        let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 500);
        let messages = resources
            .chat
            .list_messages(conversation_id, limit, query.before)
            .await?;

        let total = messages.len();
        let response = MessageListResponse { messages, total };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
