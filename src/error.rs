// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    /// The user is known but not allowed to run this command.
    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Model API error: {0}")]
    ModelGateway(String),
}

impl AppError {
    pub const MODEL_QUOTA_EXCEEDED: &'static str = "Model API quota exceeded";
    pub const MODEL_AUTH_FAILED: &'static str = "Model API rejected credentials";

    /// Message safe to show the end user in chat.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::ModelGateway(msg) if msg == Self::MODEL_QUOTA_EXCEEDED => {
                "The model is busy right now, try again later.".to_string()
            }
            AppError::ModelGateway(_) => "The model request failed.".to_string(),
            AppError::Unauthorized => "Authentication required.".to_string(),
            AppError::Persistence(_) => {
                "Something went wrong, the change may not have been saved.".to_string()
            }
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ModelGateway(msg) => {
                tracing::warn!(error = %msg, "Model API error");
                (StatusCode::BAD_GATEWAY, "model_error", Some(self.user_message()))
            }
            AppError::Persistence(err) => {
                tracing::error!(error = %err, "Persistence error");
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
