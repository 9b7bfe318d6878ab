// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for offline mode and tests.

use super::{RegistrySnapshot, Store, StoreError};
use crate::models::{UsageEvent, UserId};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Volatile store. Writes can be made to fail to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    registry: Mutex<RegistrySnapshot>,
    events: Mutex<Vec<UsageEvent>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The registry as last saved.
    pub fn saved_registry(&self) -> RegistrySnapshot {
        lock(&self.registry).clone()
    }

    /// Number of stored events across all users.
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "writes disabled on memory store".to_string(),
            ));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_registry(&self) -> RegistrySnapshot {
        lock(&self.registry).clone()
    }

    async fn save_registry(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        self.check_writable()?;
        *lock(&self.registry) = snapshot.clone();
        Ok(())
    }

    async fn append_usage_event(&self, event: &UsageEvent) -> Result<(), StoreError> {
        self.check_writable()?;
        lock(&self.events).push(event.clone());
        Ok(())
    }

    fn scan_usage_events(&self, user_id: &UserId) -> BoxStream<'static, UsageEvent> {
        let matching: Vec<UsageEvent> = lock(&self.events)
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        stream::iter(matching).boxed()
    }
}
