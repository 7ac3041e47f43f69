// ABOUTME: Per-conversation rooms of live socket connections
// ABOUTME: Tracks joined connections and fans messages out to room members
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

use crate::websocket::ChatSocketMessage;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Outbound channel handle for one live connection
pub type ConnectionSender = mpsc::UnboundedSender<ChatSocketMessage>;

/// Room membership and fan-out for live chat connections.
///
/// Rooms are keyed by conversation id. A connection may be a member of
/// several rooms at once; membership is dropped when its channel closes or
/// when the connection disconnects.
#[derive(Default)]
pub struct RoomBroadcaster {
    // conversation id -> (connection id -> outbound channel)
    rooms: RwLock<HashMap<Uuid, HashMap<Uuid, ConnectionSender>>>,
}

impl RoomBroadcaster {
    /// Create an empty broadcaster
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a conversation's room.
    ///
    /// Joining a room the connection is already in replaces its channel,
    /// so a rejoin after reconnect never leaves a stale sender behind.
    pub async fn join(&self, conversation_id: Uuid, connection_id: Uuid, sender: ConnectionSender) {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(conversation_id)
            .or_default()
            .insert(connection_id, sender);
        debug!("Connection {connection_id} joined room {conversation_id}");
    }

    /// Remove a connection from one room
    pub async fn leave(&self, conversation_id: Uuid, connection_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(&conversation_id) {
            members.remove(&connection_id);
            if members.is_empty() {
                rooms.remove(&conversation_id);
            }
        }
    }

    /// Remove a connection from every room it joined
    pub async fn leave_all(&self, connection_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
        debug!("Connection {connection_id} left all rooms");
    }

    /// Deliver an event to every member of a room, the sender included.
    ///
    /// Members whose channel has closed are dropped from the room.
    /// Returns the number of members the event was handed to.
    pub async fn broadcast(&self, conversation_id: Uuid, event: &ChatSocketMessage) -> usize {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(&conversation_id) else {
            return 0;
        };

        let before = members.len();
        members.retain(|connection_id, sender| {
            if sender.send(event.clone()).is_ok() {
                true
            } else {
                warn!("Dropping closed connection {connection_id} from room {conversation_id}");
                false
            }
        });
        let delivered = members.len();

        if members.is_empty() {
            rooms.remove(&conversation_id);
        }
        if delivered < before {
            debug!(
                "Pruned {} dead connection(s) from room {conversation_id}",
                before - delivered
            );
        }

        delivered
    }

    /// Number of live members in a room
    pub async fn room_size(&self, conversation_id: Uuid) -> usize {
        self.rooms
            .read()
            .await
            .get(&conversation_id)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use chrono::Utc;

    fn test_message(conversation_id: Uuid) -> ChatSocketMessage {
        ChatSocketMessage::ReceiveMessage {
            message: Message {
                id: Uuid::new_v4(),
                conversation_id,
                sender_id: Uuid::new_v4(),
                sender_name: "Test Sender".to_owned(),
                sender_avatar: None,
                content: "hello".to_owned(),
                is_read: false,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_members_including_sender() {
        let broadcaster = RoomBroadcaster::new();
        let room = Uuid::new_v4();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        broadcaster.join(room, Uuid::new_v4(), tx_a).await;
        broadcaster.join(room, Uuid::new_v4(), tx_b).await;

        let delivered = broadcaster.broadcast(room, &test_message(room)).await;
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_the_room() {
        let broadcaster = RoomBroadcaster::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        broadcaster.join(room_a, Uuid::new_v4(), tx_a).await;
        broadcaster.join(room_b, Uuid::new_v4(), tx_b).await;

        broadcaster.broadcast(room_a, &test_message(room_a)).await;
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_connections_are_pruned_on_broadcast() {
        let broadcaster = RoomBroadcaster::new();
        let room = Uuid::new_v4();

        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        drop(rx_dead);
        broadcaster.join(room, Uuid::new_v4(), tx_live).await;
        broadcaster.join(room, Uuid::new_v4(), tx_dead).await;

        let delivered = broadcaster.broadcast(room, &test_message(room)).await;
        assert_eq!(delivered, 1);
        assert!(rx_live.try_recv().is_ok());
        assert_eq!(broadcaster.room_size(room).await, 1);
    }

    #[tokio::test]
    async fn test_rejoin_replaces_previous_channel() {
        let broadcaster = RoomBroadcaster::new();
        let room = Uuid::new_v4();
        let connection = Uuid::new_v4();

        let (tx_old, mut rx_old) = mpsc::unbounded_channel();
        let (tx_new, mut rx_new) = mpsc::unbounded_channel();
        broadcaster.join(room, connection, tx_old).await;
        broadcaster.join(room, connection, tx_new).await;

        assert_eq!(broadcaster.room_size(room).await, 1);
        broadcaster.broadcast(room, &test_message(room)).await;
        assert!(rx_old.try_recv().is_err());
        assert!(rx_new.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_leave_all_removes_connection_everywhere() {
        let broadcaster = RoomBroadcaster::new();
        let room_a = Uuid::new_v4();
        let room_b = Uuid::new_v4();
        let connection = Uuid::new_v4();

        let (tx, _rx) = mpsc::unbounded_channel();
        broadcaster.join(room_a, connection, tx.clone()).await;
        broadcaster.join(room_b, connection, tx).await;

        broadcaster.leave_all(connection).await;
        assert_eq!(broadcaster.room_size(room_a).await, 0);
        assert_eq!(broadcaster.room_size(room_b).await, 0);
    }
}
