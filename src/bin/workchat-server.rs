// ABOUTME: Server binary for the workchat real-time chat service
// ABOUTME: Loads configuration, opens the database and serves REST plus WebSocket
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Workchat Contributors

//! # Workchat Server Binary
//!
//! Starts the chat service with JWT authentication, an `SQLite`-backed
//! message store and live `WebSocket` rooms.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use workchat::{
    config::ServerConfig, database::Database, logging, resources::ServerResources,
    server::ChatServer,
};

#[derive(Parser)]
#[command(name = "workchat-server")]
#[command(about = "Workchat - real-time chat for the job marketplace")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting Workchat server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    info!("Database initialized: {}", config.database.url);

    let resources = Arc::new(ServerResources::new(database, config));
    let server = ChatServer::new(resources);

    if let Err(e) = server.run().await {
        error!("Server terminated with error: {e}");
        return Err(e.into());
    }

    Ok(())
}
