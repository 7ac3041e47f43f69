// ABOUTME: Configuration management for the chat service
// ABOUTME: Re-exports the environment-based server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! Configuration management

/// Environment-based server configuration
pub mod environment;

pub use environment::ServerConfig;
