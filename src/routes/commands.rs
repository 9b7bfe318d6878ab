// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command endpoint called by the chat-platform adapter.

use crate::error::{AppError, Result};
use crate::models::{Command, CommandReply, UserId};
use crate::services::dispatch;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Command routes (bearer auth is applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/commands", post(run_command))
}

/// Platform user IDs arrive either as JSON numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawUserId {
    Number(u64),
    Text(String),
}

/// One inbound slash command.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub user_id: RawUserId,
    pub command: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

async fn run_command(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandReply>> {
    let user = match request.user_id {
        RawUserId::Number(id) => UserId::from(id),
        RawUserId::Text(raw) => UserId::parse(&raw)
            .ok_or_else(|| AppError::Validation("Invalid user_id".to_string()))?,
    };

    let command = Command::parse(&request.command, &request.options)?;
    let reply = dispatch(&state, &user, command).await?;
    Ok(Json(reply))
}
