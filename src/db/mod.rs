// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer.
//!
//! The registry and ledger only see the [`Store`] trait. The file-backed
//! implementation is used in production, the in-memory one offline and in
//! tests.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::models::{UsageEvent, UserId};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Durable form of the authorization registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Whitelisted users and the date of their most recent grant
    #[serde(default)]
    pub whitelist: BTreeMap<UserId, NaiveDate>,
    #[serde(default)]
    pub blacklist: BTreeSet<UserId>,
    #[serde(default)]
    pub pro_users: BTreeSet<UserId>,
}

/// Durable storage for registry state and usage events.
#[async_trait]
pub trait Store: Send + Sync {
    /// Load the registry. Never fails: missing or corrupt data yields defaults.
    async fn load_registry(&self) -> RegistrySnapshot;

    /// Replace the stored registry with `snapshot`.
    async fn save_registry(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError>;

    /// Append one event without rewriting earlier ones.
    async fn append_usage_event(&self, event: &UsageEvent) -> Result<(), StoreError>;

    /// Lazily stream every stored event for `user_id`, oldest first.
    ///
    /// Each call starts over from the beginning. Malformed records are skipped.
    fn scan_usage_events(&self, user_id: &UserId) -> BoxStream<'static, UsageEvent>;
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
