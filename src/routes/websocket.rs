// ABOUTME: WebSocket route handlers for live chat connections
// ABOUTME: Upgrades HTTP connections and hands them to the chat gateway
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use crate::websocket::ChatGateway;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{debug, info};

/// WebSocket routes implementation
pub struct WebSocketRoutes;

impl WebSocketRoutes {
    /// Create all WebSocket routes with the injected `ChatGateway`
    pub fn routes(gateway: Arc<ChatGateway>) -> Router {
        Router::new()
            .route("/ws", get(Self::handle_websocket))
            .with_state(gateway)
    }

    /// Handle WebSocket upgrade and hand the connection to the gateway
    async fn handle_websocket(
        ws: WebSocketUpgrade,
        State(gateway): State<Arc<ChatGateway>>,
    ) -> impl IntoResponse {
        info!("New WebSocket connection request");

        ws.on_upgrade(move |socket: WebSocket| async move {
            debug!("WebSocket upgraded, delegating to gateway");
            gateway.handle_connection(socket).await;
        })
    }
}
