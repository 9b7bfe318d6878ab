// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Promptgate: relay chat prompts to a model API behind per-user access control
//!
//! This crate provides the authorization registry, the token usage ledger and
//! the command endpoint a chat-platform adapter calls into.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{AuthorizationRegistry, ModelGateway, UsageLedger};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub registry: AuthorizationRegistry,
    pub ledger: UsageLedger,
    pub gateway: Arc<dyn ModelGateway>,
    /// Process start, for `uptime`
    pub started_at: Instant,
}

impl AppState {
    /// Load the registry from `store` and wire up the services.
    pub async fn new(config: Config, store: Arc<dyn Store>, gateway: Arc<dyn ModelGateway>) -> Self {
        let registry = AuthorizationRegistry::load(config.owner_id.clone(), store.clone()).await;
        let ledger = UsageLedger::new(store);

        Self {
            config,
            registry,
            ledger,
            gateway,
            started_at: Instant::now(),
        }
    }
}
