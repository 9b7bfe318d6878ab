// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are opaque: they are trimmed and checked for presence, nothing more.

use crate::models::UserId;
use std::env;
use std::path::PathBuf;

/// Models that require pro-tier membership unless overridden by `PRO_MODELS`.
pub const DEFAULT_PRO_MODELS: &[&str] = &["gpt-4", "gpt-4-32k"];

/// Registry document name inside `DATA_DIR`.
pub const REGISTRY_FILE: &str = "registry.json";

/// Usage ledger name inside `DATA_DIR`.
pub const LEDGER_FILE: &str = "usage.jsonl";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// The single bot owner; admin commands are restricted to this user
    pub owner_id: UserId,
    /// Directory holding the registry document and usage ledger
    pub data_dir: PathBuf,
    /// Base URL of the OpenAI-compatible model API
    pub model_api_base: String,
    /// Models gated behind the pro tier
    pub pro_models: Vec<String>,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Bearer token the chat-platform adapter presents on `/api/commands`
    pub dispatcher_token: String,
    /// Model API key
    pub model_api_key: String,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let owner_raw = env::var("OWNER_ID").map_err(|_| ConfigError::Missing("OWNER_ID"))?;
        let owner_id = UserId::parse(&owner_raw).ok_or(ConfigError::Invalid("OWNER_ID"))?;

        Ok(Self {
            owner_id,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            model_api_base: env::var("MODEL_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            pro_models: env::var("PRO_MODELS")
                .map(|v| parse_model_list(&v))
                .unwrap_or_else(|_| default_pro_models()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            dispatcher_token: required_secret("DISPATCHER_TOKEN")?,
            model_api_key: required_secret("MODEL_API_KEY")?,
        })
    }

    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            owner_id: UserId::from(42),
            data_dir: PathBuf::from("target/test-data"),
            model_api_base: "http://localhost:9".to_string(),
            pro_models: default_pro_models(),
            port: 8080,
            dispatcher_token: "test_dispatcher_token".to_string(),
            model_api_key: "test_model_key".to_string(),
        }
    }

    pub fn is_pro_model(&self, model: &str) -> bool {
        self.pro_models.iter().any(|m| m == model)
    }
}

fn required_secret(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.to_string())
}

fn default_pro_models() -> Vec<String> {
    DEFAULT_PRO_MODELS.iter().map(|m| m.to_string()).collect()
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("OWNER_ID", " 42 ");
        env::set_var("DISPATCHER_TOKEN", "dispatch\n");
        env::set_var("MODEL_API_KEY", "sk-test");
        env::set_var("PRO_MODELS", "gpt-4, o1 ,,");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.owner_id, UserId::from(42));
        assert_eq!(config.dispatcher_token, "dispatch");
        assert_eq!(config.pro_models, vec!["gpt-4", "o1"]);
        assert!(config.is_pro_model("o1"));
        assert!(!config.is_pro_model("gpt-3.5-turbo"));
    }

    #[test]
    fn test_parse_model_list_skips_blanks() {
        assert!(parse_model_list(" , ").is_empty());
    }
}
