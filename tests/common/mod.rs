// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use promptgate::config::Config;
use promptgate::db::MemoryStore;
use promptgate::error::AppError;
use promptgate::routes::create_router;
use promptgate::services::{Completion, ModelGateway};
use promptgate::AppState;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Model gateway that answers every prompt with a fixed completion.
pub struct StubGateway {
    pub tokens: i64,
    fail: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubGateway {
    pub fn new(tokens: i64) -> Self {
        Self {
            tokens,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelGateway for StubGateway {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::ModelGateway(
                AppError::MODEL_QUOTA_EXCEEDED.to_string(),
            ));
        }
        Ok(Completion {
            text: format!("[{}] {}", model, prompt),
            tokens_used: self.tokens,
        })
    }
}

/// Offline test harness: in-memory store, stub gateway, owner 42.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<StubGateway>,
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(StubGateway::new(25));
    let state = Arc::new(
        AppState::new(Config::test_default(), store.clone(), gateway.clone()).await,
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        gateway,
    }
}

/// Build an authenticated POST to `/api/commands`.
#[allow(dead_code)]
pub fn command_request(body: Value) -> Request<Body> {
    let token = Config::test_default().dispatcher_token;
    Request::builder()
        .method("POST")
        .uri("/api/commands")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
