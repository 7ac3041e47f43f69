// ABOUTME: Shared server resources container for dependency injection
// ABOUTME: Holds database, auth, room state and the chat gateway behind one Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::{ChatManager, Database};
use crate::rooms::RoomBroadcaster;
use crate::websocket::ChatGateway;
use std::sync::Arc;

/// Container for all shared server dependencies.
///
/// Constructed once at startup and passed into routes as Axum state, so
/// every handler and the socket gateway see the same database pool, auth
/// manager and room registry.
pub struct ServerResources {
    /// Storage layer
    pub database: Database,
    /// Conversation and message operations
    pub chat: ChatManager,
    /// JWT issuing and validation
    pub auth_manager: Arc<AuthManager>,
    /// Live room membership and fan-out
    pub rooms: Arc<RoomBroadcaster>,
    /// WebSocket session gateway
    pub gateway: Arc<ChatGateway>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble resources from the storage layer and configuration
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let auth_manager = Arc::new(AuthManager::new(
            config.auth.jwt_secret.as_bytes().to_vec(),
            config.auth.jwt_expiry_hours,
        ));
        let rooms = Arc::new(RoomBroadcaster::new());
        let chat = database.chat();
        let gateway = Arc::new(ChatGateway::new(
            chat.clone(),
            auth_manager.clone(),
            rooms.clone(),
        ));

        Self {
            database,
            chat,
            auth_manager,
            rooms,
            gateway,
            config: Arc::new(config),
        }
    }
}
