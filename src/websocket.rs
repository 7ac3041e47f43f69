// ABOUTME: WebSocket gateway for live chat sessions
// ABOUTME: Authenticates connections, manages room membership and relays messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! `WebSocket` support for live chat
//!
//! Each connection authenticates with a JWT, joins conversation rooms it is
//! authorized for, and exchanges chat messages in real time. Messages are
//! persisted before fan-out, so the socket path and the REST history always
//! agree.

use crate::auth::{AuthManager, AuthResult};
use crate::database::ChatManager;
use crate::errors::{AppError, AppResult};
use crate::models::Message as ChatMessage;
use crate::rooms::{ConnectionSender, RoomBroadcaster};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// WebSocket frame type alias for Axum
type Frame = axum::extract::ws::Message;

/// WebSocket message types for the chat protocol
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatSocketMessage {
    /// Client authentication message
    #[serde(rename = "auth")]
    Authentication {
        /// JWT authentication token
        token: String,
    },
    /// Join a conversation's room
    #[serde(rename = "join_chat")]
    JoinChat {
        /// Conversation to join
        conversation_id: Uuid,
    },
    /// Send a chat message into a conversation
    #[serde(rename = "send_message")]
    SendMessage {
        /// Conversation to post into
        conversation_id: Uuid,
        /// Claimed sender, must match the authenticated user
        sender_id: Uuid,
        /// Message body
        content: String,
    },
    /// A persisted message delivered to room members
    #[serde(rename = "receive_message")]
    ReceiveMessage {
        /// The stored message, display fields resolved
        message: ChatMessage,
    },
    /// Error message to client
    #[serde(rename = "error")]
    Error {
        /// Error description
        message: String,
    },
    /// Success confirmation message
    #[serde(rename = "success")]
    Success {
        /// Success message
        message: String,
    },
}

/// Manages live chat connections and message relay
#[derive(Clone)]
pub struct ChatGateway {
    chat: ChatManager,
    auth_manager: Arc<AuthManager>,
    rooms: Arc<RoomBroadcaster>,
}

impl ChatGateway {
    /// Creates a new chat gateway
    #[must_use]
    pub const fn new(
        chat: ChatManager,
        auth_manager: Arc<AuthManager>,
        rooms: Arc<RoomBroadcaster>,
    ) -> Self {
        Self {
            chat,
            auth_manager,
            rooms,
        }
    }

    /// Handle one incoming `WebSocket` connection until it closes
    pub async fn handle_connection(&self, ws: axum::extract::ws::WebSocket) {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ChatSocketMessage>();

        let connection_id = Uuid::new_v4();
        let mut authenticated_user: Option<Uuid> = None;

        // Forward outbound events to the socket as JSON text frames
        let ws_send_task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Ok(json) = serde_json::to_string(&event) else {
                    continue;
                };
                if ws_tx.send(Frame::Text(json)).await.is_err() {
                    break;
                }
            }
        });

        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(Frame::Text(text)) => match serde_json::from_str::<ChatSocketMessage>(&text) {
                    Ok(ChatSocketMessage::Authentication { token }) => {
                        authenticated_user = self.handle_auth_message(&token, &tx).await;
                    }
                    Ok(ChatSocketMessage::JoinChat { conversation_id }) => {
                        self.handle_join(
                            conversation_id,
                            connection_id,
                            authenticated_user,
                            &tx,
                        )
                        .await;
                    }
                    Ok(ChatSocketMessage::SendMessage {
                        conversation_id,
                        sender_id,
                        content,
                    }) => {
                        self.handle_send(
                            conversation_id,
                            sender_id,
                            &content,
                            authenticated_user,
                            &tx,
                        )
                        .await;
                    }
                    Err(e) => {
                        send_event(
                            &tx,
                            &ChatSocketMessage::Error {
                                message: format!("Invalid message format: {e}"),
                            },
                        );
                    }
                    _ => {}
                },
                Ok(Frame::Close(_)) | Err(_) => break,
                _ => {}
            }
        }

        // Clean up on disconnect
        self.rooms.leave_all(connection_id).await;
        ws_send_task.abort();
        debug!("Connection {connection_id} closed");
    }

    /// Handle authentication message and return the authenticated user id
    async fn handle_auth_message(&self, token: &str, tx: &ConnectionSender) -> Option<Uuid> {
        match self.authenticate_user(token) {
            Ok(auth_result) => {
                send_event(
                    tx,
                    &ChatSocketMessage::Success {
                        message: "Authentication successful".into(),
                    },
                );
                debug!("WebSocket authenticated for user {}", auth_result.user_id);
                Some(auth_result.user_id)
            }
            Err(e) => {
                send_event(
                    tx,
                    &ChatSocketMessage::Error {
                        message: format!("Authentication failed: {e}"),
                    },
                );
                None
            }
        }
    }

    /// Join a room after verifying the user participates in the conversation
    async fn handle_join(
        &self,
        conversation_id: Uuid,
        connection_id: Uuid,
        authenticated_user: Option<Uuid>,
        tx: &ConnectionSender,
    ) {
        let Some(user_id) = authenticated_user else {
            send_event(
                tx,
                &ChatSocketMessage::Error {
                    message: "Authentication required".into(),
                },
            );
            return;
        };

        match self.authorize_participant(conversation_id, user_id).await {
            Ok(()) => {
                self.rooms
                    .join(conversation_id, connection_id, tx.clone())
                    .await;
                send_event(
                    tx,
                    &ChatSocketMessage::Success {
                        message: format!("Joined conversation {conversation_id}"),
                    },
                );
            }
            Err(e) => {
                warn!("Join rejected for user {user_id} on {conversation_id}: {e}");
                send_event(
                    tx,
                    &ChatSocketMessage::Error {
                        message: format!("Cannot join conversation: {e}"),
                    },
                );
            }
        }
    }

    /// Persist an inbound message and fan it out to the room
    async fn handle_send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        authenticated_user: Option<Uuid>,
        tx: &ConnectionSender,
    ) {
        let Some(user_id) = authenticated_user else {
            send_event(
                tx,
                &ChatSocketMessage::Error {
                    message: "Authentication required".into(),
                },
            );
            return;
        };

        if sender_id != user_id {
            send_event(
                tx,
                &ChatSocketMessage::Error {
                    message: "Sender does not match authenticated user".into(),
                },
            );
            return;
        }

        let result = async {
            self.authorize_participant(conversation_id, user_id).await?;
            self.chat
                .append_message(conversation_id, user_id, content)
                .await
        }
        .await;

        match result {
            Ok(message) => {
                let delivered = self
                    .rooms
                    .broadcast(
                        conversation_id,
                        &ChatSocketMessage::ReceiveMessage { message },
                    )
                    .await;
                info!(
                    "Message relayed to {delivered} connection(s) in room {conversation_id}"
                );
            }
            Err(e) => {
                // Failed sends are reported only to the sender
                send_event(
                    tx,
                    &ChatSocketMessage::Error {
                        message: format!("Failed to send message: {e}"),
                    },
                );
            }
        }
    }

    /// Verify the conversation exists and the user is one of its participants
    async fn authorize_participant(&self, conversation_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let conversation = self
            .chat
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if conversation.has_participant(user_id) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "User is not a participant in this conversation",
            ))
        }
    }

    /// Authenticate a `WebSocket` user with a JWT
    fn authenticate_user(&self, token: &str) -> AppResult<AuthResult> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        self.auth_manager.validate_token(token)
    }
}

/// Queue an event for one connection; delivery failure means it is closing
fn send_event(tx: &ConnectionSender, event: &ChatSocketMessage) {
    if let Err(e) = tx.send(event.clone()) {
        warn!("Failed to queue WebSocket event: {e}");
    }
}
