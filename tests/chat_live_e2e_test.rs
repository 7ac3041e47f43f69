// ABOUTME: Real WebSocket server E2E tests for live chat sessions
// ABOUTME: Runs an actual Axum server and drives the chat protocol over tokio-tungstenite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::{json, Value};
use std::{net::TcpListener, sync::Arc, time::Duration};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsFrame, MaybeTlsStream};
use uuid::Uuid;
use workchat::{
    client::ChatApiClient,
    errors::ErrorCode,
    models::{UserProfile, UserRole},
    resources::ServerResources,
    server::build_router,
};

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

fn is_port_available(port: u16) -> bool {
    TcpListener::bind(format!("127.0.0.1:{port}")).is_ok()
}

fn find_available_port() -> u16 {
    let mut rng = rand::thread_rng();
    for _ in 0..100 {
        let port = rng.gen_range(10000..60000);
        if is_port_available(port) {
            return port;
        }
    }
    panic!("Could not find an available port after 100 attempts");
}

/// Live test server with its own database and socket endpoint
struct TestServer {
    port: u16,
    resources: Arc<ServerResources>,
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Result<Self> {
        let (resources, temp_dir) = common::create_test_resources().await?;
        let port = find_available_port();
        let app = build_router(resources.clone());

        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}"))
                .await
                .unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for the listener to come up
        sleep(Duration::from_millis(300)).await;

        Ok(Self {
            port,
            resources,
            _temp_dir: temp_dir,
        })
    }

    async fn connect(&self) -> Result<WsStream> {
        let (stream, _) = connect_async(format!("ws://127.0.0.1:{}/ws", self.port)).await?;
        Ok(stream)
    }

    fn token_for(&self, user: &UserProfile) -> String {
        self.resources
            .auth_manager
            .generate_token(user.id, &user.display_name)
            .expect("Failed to generate token")
    }
}

async fn send_json(stream: &mut WsStream, value: &Value) -> Result<()> {
    stream.send(WsFrame::Text(value.to_string())).await?;
    Ok(())
}

async fn next_json(stream: &mut WsStream) -> Result<Value> {
    loop {
        let frame = timeout(Duration::from_secs(5), stream.next())
            .await?
            .expect("Stream closed unexpectedly")?;
        if let WsFrame::Text(text) = frame {
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

/// Connect, authenticate and join a conversation's room
async fn join_room(server: &TestServer, user: &UserProfile, conversation_id: Uuid) -> Result<WsStream> {
    let mut stream = server.connect().await?;

    send_json(&mut stream, &json!({ "type": "auth", "token": server.token_for(user) })).await?;
    let authed = next_json(&mut stream).await?;
    assert_eq!(authed["type"], "success");

    send_json(
        &mut stream,
        &json!({ "type": "join_chat", "conversation_id": conversation_id }),
    )
    .await?;
    let joined = next_json(&mut stream).await?;
    assert_eq!(joined["type"], "success");

    Ok(stream)
}

#[tokio::test]
async fn test_rest_client_round_trip_against_live_server() -> Result<()> {
    let server = TestServer::start().await?;
    let db = &server.resources.database;
    let employer = common::create_test_user(db, "Hiring Co", UserRole::Employer).await?;
    let seeker = common::create_test_user(db, "Alex", UserRole::Seeker).await?;

    let base_url = format!("http://127.0.0.1:{}", server.port);
    let client = ChatApiClient::new(&base_url, server.token_for(&seeker));

    let job_id = Uuid::new_v4();
    let conversation = client.initiate_chat(job_id, employer.id).await?;
    assert_eq!(conversation.employer_id, employer.id);
    assert_eq!(conversation.seeker_id, seeker.id);
    assert_eq!(conversation.job_id, Some(job_id));

    server
        .resources
        .chat
        .append_message(conversation.id, seeker.id, "hello")
        .await?;

    let chats = client.my_chats(None, None).await?;
    assert_eq!(chats.total, 1);
    assert_eq!(chats.conversations[0].id, conversation.id);
    assert_eq!(chats.conversations[0].counterpart.id, employer.id);

    let history = client.messages(conversation.id, Some(10), None).await?;
    assert_eq!(history.total, 1);
    assert_eq!(history.messages[0].content, "hello");

    // A cursor at the oldest message yields an empty earlier page
    let earlier = client
        .messages(conversation.id, Some(10), Some(history.messages[0].id))
        .await?;
    assert!(earlier.messages.is_empty());

    // A rejected request surfaces as an external-service error
    let err = client
        .messages(Uuid::new_v4(), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    Ok(())
}

#[tokio::test]
async fn test_invalid_token_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let mut stream = server.connect().await?;

    send_json(&mut stream, &json!({ "type": "auth", "token": "not-a-jwt" })).await?;
    let response = next_json(&mut stream).await?;
    assert_eq!(response["type"], "error");
    Ok(())
}

#[tokio::test]
async fn test_join_requires_authentication() -> Result<()> {
    let server = TestServer::start().await?;
    let mut stream = server.connect().await?;

    send_json(
        &mut stream,
        &json!({ "type": "join_chat", "conversation_id": Uuid::new_v4() }),
    )
    .await?;
    let response = next_json(&mut stream).await?;
    assert_eq!(response["type"], "error");
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("Authentication required"));
    Ok(())
}

#[tokio::test]
async fn test_non_participant_cannot_join_room() -> Result<()> {
    let server = TestServer::start().await?;
    let db = &server.resources.database;
    let employer = common::create_test_user(db, "Hiring Co", UserRole::Employer).await?;
    let seeker = common::create_test_user(db, "Alex", UserRole::Seeker).await?;
    let outsider = common::create_test_user(db, "Sam", UserRole::Seeker).await?;

    let conversation = server
        .resources
        .chat
        .get_or_create_conversation(Uuid::new_v4(), employer.id, seeker.id)
        .await?;

    let mut stream = server.connect().await?;
    send_json(&mut stream, &json!({ "type": "auth", "token": server.token_for(&outsider) })).await?;
    assert_eq!(next_json(&mut stream).await?["type"], "success");

    send_json(
        &mut stream,
        &json!({ "type": "join_chat", "conversation_id": conversation.id }),
    )
    .await?;
    let response = next_json(&mut stream).await?;
    assert_eq!(response["type"], "error");
    Ok(())
}

#[tokio::test]
async fn test_message_reaches_both_room_members_and_is_persisted() -> Result<()> {
    let server = TestServer::start().await?;
    let db = &server.resources.database;
    let employer = common::create_test_user(db, "Hiring Co", UserRole::Employer).await?;
    let seeker = common::create_test_user(db, "Alex", UserRole::Seeker).await?;

    let conversation = server
        .resources
        .chat
        .get_or_create_conversation(Uuid::new_v4(), employer.id, seeker.id)
        .await?;

    let mut seeker_stream = join_room(&server, &seeker, conversation.id).await?;
    let mut employer_stream = join_room(&server, &employer, conversation.id).await?;

    send_json(
        &mut seeker_stream,
        &json!({
            "type": "send_message",
            "conversation_id": conversation.id,
            "sender_id": seeker.id,
            "content": "Is the position still open?",
        }),
    )
    .await?;

    // Both sides, the sender included, receive the stored message
    for stream in [&mut seeker_stream, &mut employer_stream] {
        let event = next_json(stream).await?;
        assert_eq!(event["type"], "receive_message");
        assert_eq!(event["message"]["content"], "Is the position still open?");
        assert_eq!(
            event["message"]["sender_id"],
            seeker.id.to_string().as_str()
        );
        assert_eq!(event["message"]["sender_name"], "Alex");
    }

    // The socket path and the history agree
    let history = server
        .resources
        .chat
        .list_messages(conversation.id, 10, None)
        .await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "Is the position still open?");
    Ok(())
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() -> Result<()> {
    let server = TestServer::start().await?;
    let db = &server.resources.database;
    let employer = common::create_test_user(db, "Hiring Co", UserRole::Employer).await?;
    let seeker = common::create_test_user(db, "Alex", UserRole::Seeker).await?;

    let conversation = server
        .resources
        .chat
        .get_or_create_conversation(Uuid::new_v4(), employer.id, seeker.id)
        .await?;

    let mut seeker_stream = join_room(&server, &seeker, conversation.id).await?;
    let mut employer_stream = join_room(&server, &employer, conversation.id).await?;

    for content in ["first", "second"] {
        send_json(
            &mut seeker_stream,
            &json!({
                "type": "send_message",
                "conversation_id": conversation.id,
                "sender_id": seeker.id,
                "content": content,
            }),
        )
        .await?;
    }

    for stream in [&mut seeker_stream, &mut employer_stream] {
        assert_eq!(next_json(stream).await?["message"]["content"], "first");
        assert_eq!(next_json(stream).await?["message"]["content"], "second");
    }

    let history = server
        .resources
        .chat
        .list_messages(conversation.id, 10, None)
        .await?;
    assert_eq!(history[0].content, "first");
    assert_eq!(history[1].content, "second");
    Ok(())
}

#[tokio::test]
async fn test_sender_identity_must_match_authenticated_user() -> Result<()> {
    let server = TestServer::start().await?;
    let db = &server.resources.database;
    let employer = common::create_test_user(db, "Hiring Co", UserRole::Employer).await?;
    let seeker = common::create_test_user(db, "Alex", UserRole::Seeker).await?;

    let conversation = server
        .resources
        .chat
        .get_or_create_conversation(Uuid::new_v4(), employer.id, seeker.id)
        .await?;

    let mut stream = join_room(&server, &seeker, conversation.id).await?;

    // Claim the employer's identity while authenticated as the seeker
    send_json(
        &mut stream,
        &json!({
            "type": "send_message",
            "conversation_id": conversation.id,
            "sender_id": employer.id,
            "content": "spoofed",
        }),
    )
    .await?;

    let response = next_json(&mut stream).await?;
    assert_eq!(response["type"], "error");

    let history = server
        .resources
        .chat
        .list_messages(conversation.id, 10, None)
        .await?;
    assert!(history.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_send_is_reported_only_to_sender() -> Result<()> {
    let server = TestServer::start().await?;
    let db = &server.resources.database;
    let employer = common::create_test_user(db, "Hiring Co", UserRole::Employer).await?;
    let seeker = common::create_test_user(db, "Alex", UserRole::Seeker).await?;

    let conversation = server
        .resources
        .chat
        .get_or_create_conversation(Uuid::new_v4(), employer.id, seeker.id)
        .await?;

    let mut seeker_stream = join_room(&server, &seeker, conversation.id).await?;
    let mut employer_stream = join_room(&server, &employer, conversation.id).await?;

    // Blank content fails validation before any fan-out
    send_json(
        &mut seeker_stream,
        &json!({
            "type": "send_message",
            "conversation_id": conversation.id,
            "sender_id": seeker.id,
            "content": "   ",
        }),
    )
    .await?;

    let nack = next_json(&mut seeker_stream).await?;
    assert_eq!(nack["type"], "error");

    // The other member sees nothing for the failed send
    let silent = timeout(Duration::from_millis(500), employer_stream.next()).await;
    assert!(silent.is_err());
    Ok(())
}
