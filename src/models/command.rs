// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inbound commands as a closed set of variants.

use super::UserId;
use crate::error::AppError;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Owner-only operations on the registry and ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Whitelist,
    Blacklist,
    SetPro,
    ViewStats,
    /// Drop a whitelist entry without blacklisting
    RemoveUser,
}

impl FromStr for AdminAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "whitelist" => Ok(Self::Whitelist),
            "blacklist" => Ok(Self::Blacklist),
            "set-pro" => Ok(Self::SetPro),
            "view-stats" => Ok(Self::ViewStats),
            "remove" => Ok(Self::RemoveUser),
            _ => Err(AppError::Validation("Invalid action.".to_string())),
        }
    }
}

/// A parsed command from the chat-platform adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Uptime,
    Ask { model: String, prompt: String },
    Admin { action: AdminAction, target: UserId },
}

impl Command {
    /// Map a command name and its options onto a [`Command`].
    pub fn parse(name: &str, options: &HashMap<String, String>) -> Result<Self, AppError> {
        match name.trim() {
            "ping" => Ok(Self::Ping),
            "uptime" => Ok(Self::Uptime),
            "model" | "ask" => {
                let model = required(options, "model")?;
                let prompt = options.get("prompt").cloned().unwrap_or_default();
                Ok(Self::Ask {
                    model: model.to_string(),
                    prompt,
                })
            }
            "config-user" => {
                let action = required(options, "action")?.parse()?;
                Ok(Self::Admin {
                    action,
                    target: target_user(options)?,
                })
            }
            "remove_user" => Ok(Self::Admin {
                action: AdminAction::RemoveUser,
                target: target_user(options)?,
            }),
            other => Err(AppError::Validation(format!("Unknown command: {}", other))),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Uptime => "uptime",
            Self::Ask { .. } => "model",
            Self::Admin { .. } => "config-user",
        }
    }
}

fn required<'a>(options: &'a HashMap<String, String>, key: &str) -> Result<&'a str, AppError> {
    options
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing option: {}", key)))
}

fn target_user(options: &HashMap<String, String>) -> Result<UserId, AppError> {
    UserId::parse(required(options, "user_id")?)
        .ok_or_else(|| AppError::Validation("Invalid user_id".to_string()))
}

/// Reply handed back to the adapter for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub content: String,
    /// Only visible to the invoking user
    pub ephemeral: bool,
}

impl CommandReply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_config_user_actions() {
        let cmd = Command::parse(
            "config-user",
            &opts(&[("action", "set-pro"), ("user_id", "9")]),
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::Admin {
                action: AdminAction::SetPro,
                target: UserId::from(9)
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let err = Command::parse(
            "config-user",
            &opts(&[("action", "promote"), ("user_id", "9")]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Invalid action."));
    }

    #[test]
    fn test_parse_remove_user() {
        let cmd = Command::parse("remove_user", &opts(&[("user_id", "12")])).unwrap();
        assert_eq!(
            cmd,
            Command::Admin {
                action: AdminAction::RemoveUser,
                target: UserId::from(12)
            }
        );
    }

    #[test]
    fn test_parse_model_requires_model_name() {
        assert!(Command::parse("model", &opts(&[("prompt", "hi")])).is_err());

        let cmd = Command::parse("model", &opts(&[("model", "gpt-4")])).unwrap();
        assert_eq!(
            cmd,
            Command::Ask {
                model: "gpt-4".to_string(),
                prompt: String::new()
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            Command::parse("dance", &HashMap::new()),
            Err(AppError::Validation(_))
        ));
    }
}
