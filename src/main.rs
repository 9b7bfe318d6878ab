// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Promptgate API Server
//!
//! Receives slash commands from the chat-platform adapter, checks them
//! against the authorization registry, relays prompts to the model API and
//! records token usage.

use promptgate::{
    config::Config,
    db::{FileStore, Store},
    services::{ModelGateway, OpenAiGateway},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        owner_id = %config.owner_id,
        "Starting Promptgate"
    );

    // Open persistent store
    let store: Arc<dyn Store> = Arc::new(
        FileStore::open(&config.data_dir)
            .await
            .expect("Failed to open data directory"),
    );

    let gateway: Arc<dyn ModelGateway> = Arc::new(OpenAiGateway::new(
        config.model_api_base.clone(),
        config.model_api_key.clone(),
    ));
    tracing::info!(
        base_url = %config.model_api_base,
        pro_models = ?config.pro_models,
        "Model gateway initialized"
    );

    // Build shared state (loads the registry)
    let state = Arc::new(AppState::new(config.clone(), store, gateway).await);

    // Build router
    let app = promptgate::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("promptgate=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
