// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authorization registry: whitelist, blacklist and pro-tier membership.
//!
//! The registry is loaded once at startup and written through to the
//! [`Store`] on every mutation. A single `RwLock` guards the sets; mutations
//! hold the write lock across persistence, so they apply in the order they
//! were issued and no interleaving can leave a user both blacklisted and
//! whitelisted.

use crate::db::{RegistrySnapshot, Store};
use crate::error::{AppError, Result};
use crate::models::{UserId, UserRecord};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory membership sets backed by durable storage.
pub struct AuthorizationRegistry {
    owner_id: UserId,
    state: RwLock<RegistrySnapshot>,
    store: Arc<dyn Store>,
}

impl AuthorizationRegistry {
    /// Load the registry from `store`. Missing or corrupt data starts empty.
    pub async fn load(owner_id: UserId, store: Arc<dyn Store>) -> Self {
        let snapshot = store.load_registry().await;
        Self {
            owner_id,
            state: RwLock::new(snapshot),
            store,
        }
    }

    /// True only for the configured owner. Independent of the membership sets.
    pub fn is_owner(&self, user: &UserId) -> bool {
        *user == self.owner_id
    }

    /// Whitelisted and not blacklisted; the blacklist always wins.
    pub async fn is_whitelisted(&self, user: &UserId) -> bool {
        let state = self.state.read().await;
        state.whitelist.contains_key(user) && !state.blacklist.contains(user)
    }

    pub async fn is_blacklisted(&self, user: &UserId) -> bool {
        self.state.read().await.blacklist.contains(user)
    }

    pub async fn is_pro(&self, user: &UserId) -> bool {
        self.state.read().await.pro_users.contains(user)
    }

    /// Consistent view of one user's memberships.
    pub async fn user_record(&self, user: &UserId) -> UserRecord {
        let state = self.state.read().await;
        let is_blacklisted = state.blacklist.contains(user);
        UserRecord {
            user_id: user.clone(),
            is_pro: state.pro_users.contains(user),
            whitelisted_since: state
                .whitelist
                .get(user)
                .copied()
                .filter(|_| !is_blacklisted),
            is_blacklisted,
        }
    }

    /// Copy of the current in-memory state.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.state.read().await.clone()
    }

    /// Add or refresh a whitelist entry. Blacklist and pro status are untouched,
    /// so a blacklisted user stays locked out until the entry is no longer
    /// shadowed.
    ///
    /// If saving fails the grant stays in effect for this process and the
    /// error is returned.
    pub async fn grant_whitelist(&self, user: &UserId, as_of: NaiveDate) -> Result<()> {
        let mut state = self.state.write().await;
        state.whitelist.insert(user.clone(), as_of);
        tracing::info!(user_id = %user, as_of = %as_of, "Whitelist granted");
        self.persist(&state, "grant_whitelist").await
    }

    /// Remove a whitelist entry without blacklisting. Returns whether an
    /// entry existed, including one shadowed by the blacklist.
    ///
    /// Nothing is saved when there was no entry. If saving fails the removal
    /// stays in effect for this process and the error is returned.
    pub async fn revoke_whitelist(&self, user: &UserId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.whitelist.remove(user).is_none() {
            return Ok(false);
        }
        tracing::info!(user_id = %user, "Whitelist revoked");
        self.persist(&state, "revoke_whitelist").await?;
        Ok(true)
    }

    /// Remove any whitelist entry and blacklist the user, all or nothing.
    ///
    /// On a persistence failure the in-memory sets are left exactly as they
    /// were before the call.
    pub async fn revoke_and_blacklist(&self, user: &UserId) -> Result<()> {
        let mut state = self.state.write().await;

        let mut next = state.clone();
        next.whitelist.remove(user);
        next.blacklist.insert(user.clone());

        self.persist(&next, "revoke_and_blacklist").await?;
        *state = next;
        tracing::info!(user_id = %user, "User blacklisted");
        Ok(())
    }

    /// Add a user to the pro tier. Does not imply whitelist membership.
    pub async fn grant_pro(&self, user: &UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state.pro_users.insert(user.clone());
        tracing::info!(user_id = %user, "Pro tier granted");
        self.persist(&state, "grant_pro").await
    }

    async fn persist(&self, snapshot: &RegistrySnapshot, operation: &'static str) -> Result<()> {
        self.store.save_registry(snapshot).await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to persist registry");
            AppError::Persistence(e)
        })
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Permitted,
    NotWhitelisted,
    Blacklisted,
    /// Allowed to use the bot, but not the requested pro-tier model
    ProRequired,
}

impl Access {
    pub fn is_permitted(self) -> bool {
        self == Access::Permitted
    }
}

/// Decide whether `user` may run a command.
///
/// Permitted when the user is the owner, or whitelisted and not blacklisted.
/// Pro-tier commands additionally require pro membership, owner included.
pub async fn authorize(
    registry: &AuthorizationRegistry,
    user: &UserId,
    requires_pro: bool,
) -> Access {
    let record = registry.user_record(user).await;

    if !registry.is_owner(user) {
        if record.is_blacklisted {
            return Access::Blacklisted;
        }
        if !record.is_whitelisted() {
            return Access::NotWhitelisted;
        }
    }

    if requires_pro && !record.is_pro {
        return Access::ProRequired;
    }

    Access::Permitted
}
