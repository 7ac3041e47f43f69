// ABOUTME: Route module organization for the chat service HTTP endpoints
// ABOUTME: Groups route definitions by domain with thin handlers over the service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! Route modules for the chat server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the storage and room layers.

/// Chat conversation and message history routes
pub mod chat;
/// Health check and system status routes
pub mod health;
/// WebSocket routes for live chat sessions
pub mod websocket;

/// Chat route handlers
pub use chat::ChatRoutes;
/// Health check route handlers
pub use health::HealthRoutes;
/// WebSocket route handlers
pub use websocket::WebSocketRoutes;
