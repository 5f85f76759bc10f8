//! fleetwatch - fleet monitoring dashboard service
//!
//! Polls the fleet backend, shapes driver, trip and statistics data for the
//! dashboard, and keeps the local device roster.

mod config;
mod dashboard;
mod db;
mod map;
mod poller;
mod provider;
mod session;
mod web;

use config::ServerConfig;
use db::Store;
use poller::SummaryPoller;
use provider::ApiClient;
use session::Session;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("fleetwatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting fleetwatch on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);
    tracing::info!("Fleet backend at {}", cfg.api_url);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    let session = Arc::new(Session::new(store.clone()));
    if let Some(user) = session.profile() {
        tracing::info!("Resuming session for {}", user.username);
    }

    let client = Arc::new(ApiClient::new(&cfg.api_url, cfg.request_timeout, session.clone())?);

    // Start polling the live summary
    let poller = Arc::new(SummaryPoller::new(client.clone(), cfg.poll_interval));
    poller.start();
    poller.follow_session(session.subscribe());

    // Start web server
    let server = Server::new(cfg, store, session, client, poller.clone());
    let result = server.start().await;

    poller.stop();
    result
}
