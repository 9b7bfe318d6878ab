// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token usage events and their rollups.

use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed interaction. Stored as a single JSON line in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// When the interaction completed (UTC)
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    /// Tokens charged by the model API (0 for non-model commands)
    pub token_count: u64,
}

/// Per-user rollups derived from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    /// Tokens used since midnight UTC
    pub daily: u64,
    /// Tokens used since the first of the month (UTC)
    pub monthly: u64,
    /// Tokens used over the whole ledger
    pub total: u64,
    /// Number of recorded interactions
    pub commands: u64,
    /// Most recent interaction
    pub last_used: Option<DateTime<Utc>>,
}
