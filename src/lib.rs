// ABOUTME: Main library entry point for the workchat real-time chat service
// ABOUTME: Provides REST and WebSocket chat for the job marketplace platform
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

#![deny(unsafe_code)]

//! # Workchat
//!
//! Real-time chat between employers and job seekers: one conversation per
//! (job, employer, seeker) triple, message history over REST and live
//! delivery over `WebSocket` rooms.
//!
//! ## Architecture
//!
//! - **Database**: `SQLite`-backed conversation registry and append-only
//!   message store
//! - **Rooms**: per-conversation fan-out to live socket connections
//! - **`WebSocket`**: authenticated chat sessions speaking a JSON protocol
//!   tagged by `"type"`
//! - **Routes**: REST endpoints for initiating chats, listing them and
//!   paging history
//! - **Client**: a local chat cache and typed HTTP client for frontends
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use workchat::config::ServerConfig;
//! use workchat::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Workchat configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT authentication for REST and `WebSocket` sessions
pub mod auth;
/// Client-side chat cache and REST client
pub mod client;
/// Environment-driven server configuration
pub mod config;
/// Conversation registry, message store and participant directory
pub mod database;
/// Error types and HTTP error responses
pub mod errors;
/// Structured logging configuration
pub mod logging;
/// Domain models shared between server and client
pub mod models;
/// Shared server resource container
pub mod resources;
/// Per-conversation rooms of live connections
pub mod rooms;
/// HTTP route definitions by domain
pub mod routes;
/// Server assembly and lifecycle
pub mod server;
/// `WebSocket` chat session gateway
pub mod websocket;
