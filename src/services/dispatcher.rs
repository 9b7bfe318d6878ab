// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command dispatch: authorization, model calls and usage accounting.
//!
//! Flow for every command:
//! 1. Check access against the registry (owner-only for admin actions)
//! 2. Run the command, calling the model API where needed
//! 3. Record usage only once the command has succeeded

use crate::error::{AppError, Result};
use crate::models::{AdminAction, Command, CommandReply, UserId};
use crate::services::registry::{authorize, Access};
use crate::time_utils::{format_uptime, format_utc_rfc3339, today_utc};
use crate::AppState;
use chrono::Utc;
use std::time::Instant;

const NO_PERMISSION: &str = "You do not have permission to use this command.";
const NOT_ALLOWED: &str = "You are not allowed to use this bot.";
const PRO_REQUIRED: &str = "Sorry, you're not authenticated to use this model";

/// Run `command` on behalf of `user`.
pub async fn dispatch(state: &AppState, user: &UserId, command: Command) -> Result<CommandReply> {
    let received = Instant::now();
    tracing::info!(user_id = %user, command = command.name(), "Dispatching command");

    match command {
        Command::Ping => {
            require_access(state, user, false).await?;
            record_interaction(state, user, 0).await;
            let latency_ms = received.elapsed().as_millis();
            Ok(CommandReply::public(format!("Pong! {} ms", latency_ms)))
        }
        Command::Uptime => {
            require_access(state, user, false).await?;
            record_interaction(state, user, 0).await;
            let uptime = format_uptime(state.started_at.elapsed().as_secs());
            Ok(CommandReply::public(format!("Uptime: {}", uptime)))
        }
        Command::Ask { model, prompt } => {
            require_access(state, user, state.config.is_pro_model(&model)).await?;

            // A failed call is never billed
            let completion = state.gateway.complete(&model, &prompt).await?;
            record_interaction(state, user, completion.tokens_used).await;

            Ok(CommandReply::public(completion.text))
        }
        Command::Admin { action, target } => {
            if !state.registry.is_owner(user) {
                tracing::warn!(user_id = %user, "Non-owner attempted admin command");
                return Err(AppError::Forbidden(NO_PERMISSION.to_string()));
            }
            run_admin(state, action, &target).await
        }
    }
}

async fn require_access(state: &AppState, user: &UserId, requires_pro: bool) -> Result<()> {
    match authorize(&state.registry, user, requires_pro).await {
        Access::Permitted => Ok(()),
        Access::ProRequired => Err(AppError::Forbidden(PRO_REQUIRED.to_string())),
        denied => {
            tracing::info!(user_id = %user, access = ?denied, "Command denied");
            Err(AppError::Forbidden(NOT_ALLOWED.to_string()))
        }
    }
}

/// Record usage after a successful command.
///
/// The command already happened, so a ledger failure is logged rather than
/// turned into an error for the user.
async fn record_interaction(state: &AppState, user: &UserId, tokens: i64) {
    if let Err(e) = state.ledger.record_usage(user, tokens, Utc::now()).await {
        tracing::error!(user_id = %user, tokens, error = %e, "Usage not recorded");
    }
}

async fn run_admin(state: &AppState, action: AdminAction, target: &UserId) -> Result<CommandReply> {
    tracing::info!(target_user = %target, action = ?action, "Admin action");

    match action {
        AdminAction::Whitelist => {
            state.registry.grant_whitelist(target, today_utc()).await?;
            Ok(CommandReply::ephemeral(format!("User {} whitelisted.", target)))
        }
        AdminAction::Blacklist => {
            state.registry.revoke_and_blacklist(target).await?;
            Ok(CommandReply::ephemeral(format!("User {} blacklisted.", target)))
        }
        AdminAction::SetPro => {
            state.registry.grant_pro(target).await?;
            Ok(CommandReply::ephemeral(format!("User {} marked as pro.", target)))
        }
        AdminAction::RemoveUser => {
            if state.registry.revoke_whitelist(target).await? {
                Ok(CommandReply::ephemeral(format!("Removed user {}", target)))
            } else {
                Ok(CommandReply::ephemeral("User not found."))
            }
        }
        AdminAction::ViewStats => {
            let record = state.registry.user_record(target).await;
            let stats = state.ledger.usage_stats(target, today_utc()).await;

            let whitelisted = match record.whitelisted_since {
                Some(date) => format!("since {}", date),
                None => "no".to_string(),
            };
            let last_use = stats
                .last_used
                .map(format_utc_rfc3339)
                .unwrap_or_else(|| "never".to_string());

            Ok(CommandReply::ephemeral(format!(
                "Pro: {}, Whitelisted: {}, Blacklisted: {}, Commands: {}, \
                 Tokens: {} today / {} this month / {} total, Last use: {}",
                record.is_pro,
                whitelisted,
                record.is_blacklisted,
                stats.commands,
                stats.daily,
                stats.monthly,
                stats.total,
                last_use
            )))
        }
    }
}
