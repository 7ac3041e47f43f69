// ABOUTME: Client-side support for the chat service
// ABOUTME: Local conversation cache plus a typed HTTP client for the REST API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! Client-side chat support
//!
//! [`cache::ChatCache`] keeps a local, idempotent view of conversations and
//! their message sequences; [`api::ChatApiClient`] talks to the REST
//! endpoints. Together they back a chat UI that merges live socket events
//! and fetched history pages without duplicates.

pub mod api;
pub mod cache;

pub use api::ChatApiClient;
pub use cache::ChatCache;
