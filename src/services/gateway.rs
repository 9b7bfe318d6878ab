// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Model API client.
//!
//! Handles:
//! - Chat completion requests against an OpenAI-compatible endpoint
//! - Token usage extraction for the ledger
//! - Quota (429) and credential (401) detection

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Tokens charged for the call, as reported by the API
    pub tokens_used: i64,
}

/// Something that can turn a prompt into a completion.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, AppError>;
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct OpenAiGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Model API rate limit or quota hit (429)");
                return Err(AppError::ModelGateway(
                    AppError::MODEL_QUOTA_EXCEEDED.to_string(),
                ));
            }

            if status.as_u16() == 401 {
                return Err(AppError::ModelGateway(
                    AppError::MODEL_AUTH_FAILED.to_string(),
                ));
            }

            return Err(AppError::ModelGateway(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ModelGateway(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ModelGateway(e.to_string()))?;

        let parsed: ChatResponse = self.check_response_json(response).await?;
        let completion = parsed.into_completion()?;

        tracing::debug!(
            model,
            tokens = completion.tokens_used,
            "Model completion received"
        );
        Ok(completion)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Subset of the chat completions response we care about.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: i64,
}

impl ChatResponse {
    fn into_completion(self) -> Result<Completion, AppError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::ModelGateway("Response contained no choices".to_string()))?;

        Ok(Completion {
            text,
            tokens_used: self.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}
