// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Usage ledger: token accounting with daily, monthly and total rollups.
//!
//! Events are appended to the [`Store`] and never rewritten. Rollups are not
//! stored; each query scans the user's events.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{UsageEvent, UsageStats, UserId};
use crate::time_utils::first_of_month;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::StreamExt;
use std::sync::Arc;

/// Append-only token ledger.
#[derive(Clone)]
pub struct UsageLedger {
    store: Arc<dyn Store>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record one interaction. Negative counts are rejected before anything
    /// is written; zero is a valid, free interaction.
    pub async fn record_usage(
        &self,
        user: &UserId,
        token_count: i64,
        at: DateTime<Utc>,
    ) -> Result<UsageEvent> {
        let token_count = u64::try_from(token_count).map_err(|_| {
            AppError::Validation(format!("Token count must be non-negative, got {}", token_count))
        })?;

        let event = UsageEvent {
            timestamp: at,
            user_id: user.clone(),
            token_count,
        };

        self.store.append_usage_event(&event).await.map_err(|e| {
            tracing::error!(user_id = %user, error = %e, "Failed to append usage event");
            AppError::Persistence(e)
        })?;

        tracing::debug!(user_id = %user, tokens = token_count, "Usage recorded");
        Ok(event)
    }

    /// Sum of tokens for `user` over events dated (UTC) on or after `window_start`.
    pub async fn usage_since(&self, user: &UserId, window_start: NaiveDate) -> u64 {
        self.store
            .scan_usage_events(user)
            .fold(0u64, |sum, event| async move {
                if event.timestamp.date_naive() >= window_start {
                    sum.saturating_add(event.token_count)
                } else {
                    sum
                }
            })
            .await
    }

    /// Daily, monthly and total rollups as of `today` (UTC), in one scan.
    pub async fn usage_stats(&self, user: &UserId, today: NaiveDate) -> UsageStats {
        let month_start = first_of_month(today);

        self.store
            .scan_usage_events(user)
            .fold(UsageStats::default(), |mut stats, event| async move {
                let day = event.timestamp.date_naive();
                if day >= today {
                    stats.daily = stats.daily.saturating_add(event.token_count);
                }
                if day >= month_start {
                    stats.monthly = stats.monthly.saturating_add(event.token_count);
                }
                stats.total = stats.total.saturating_add(event.token_count);
                stats.commands += 1;
                if stats.last_used.map_or(true, |last| event.timestamp > last) {
                    stats.last_used = Some(event.timestamp);
                }
                stats
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_rollups_across_month_boundary() {
        let ledger = UsageLedger::new(Arc::new(MemoryStore::new()));
        let user = UserId::from(7);

        ledger
            .record_usage(&user, 120, ts("2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        ledger
            .record_usage(&user, 30, ts("2024-02-01T00:00:00Z"))
            .await
            .unwrap();

        let stats = ledger.usage_stats(&user, date(2024, 2, 1)).await;
        assert_eq!(stats.daily, 30);
        assert_eq!(stats.monthly, 30);
        assert_eq!(stats.total, 150);
        assert_eq!(stats.commands, 2);
        assert_eq!(stats.last_used, Some(ts("2024-02-01T00:00:00Z")));
    }

    #[tokio::test]
    async fn test_instant_before_month_start_excluded() {
        let ledger = UsageLedger::new(Arc::new(MemoryStore::new()));
        let user = UserId::from(7);

        ledger
            .record_usage(&user, 5, ts("2024-02-29T23:59:59.999999999Z"))
            .await
            .unwrap();
        ledger
            .record_usage(&user, 11, ts("2024-03-01T00:00:00Z"))
            .await
            .unwrap();

        let stats = ledger.usage_stats(&user, date(2024, 3, 15)).await;
        assert_eq!(stats.monthly, 11);
        assert_eq!(stats.daily, 0);
        assert_eq!(stats.total, 16);
    }

    #[tokio::test]
    async fn test_negative_token_count_rejected_without_write() {
        let store = Arc::new(MemoryStore::new());
        let ledger = UsageLedger::new(store.clone());

        let result = ledger
            .record_usage(&UserId::from(7), -1, ts("2024-01-01T00:00:00Z"))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_tokens_counts_as_interaction() {
        let ledger = UsageLedger::new(Arc::new(MemoryStore::new()));
        let user = UserId::from(7);

        ledger
            .record_usage(&user, 0, ts("2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let stats = ledger.usage_stats(&user, date(2024, 1, 1)).await;
        assert_eq!(stats.total, 0);
        assert_eq!(stats.commands, 1);
        assert!(stats.last_used.is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_has_zero_stats() {
        let ledger = UsageLedger::new(Arc::new(MemoryStore::new()));
        let stats = ledger
            .usage_stats(&UserId::from(999), date(2024, 1, 1))
            .await;
        assert_eq!(stats, UsageStats::default());
    }

    #[tokio::test]
    async fn test_usage_since_filters_by_user() {
        let ledger = UsageLedger::new(Arc::new(MemoryStore::new()));
        let alice = UserId::from(1);
        let bob = UserId::from(2);
        let at = ts("2024-05-05T12:00:00Z");

        ledger.record_usage(&alice, 10, at).await.unwrap();
        ledger.record_usage(&bob, 1000, at).await.unwrap();
        ledger.record_usage(&alice, 15, at).await.unwrap();

        assert_eq!(ledger.usage_since(&alice, NaiveDate::MIN).await, 25);
        assert_eq!(ledger.usage_since(&alice, date(2024, 5, 6)).await, 0);
    }

    #[tokio::test]
    async fn test_persist_failure_reported() {
        let store = Arc::new(MemoryStore::new());
        let ledger = UsageLedger::new(store.clone());
        store.set_fail_writes(true);

        let result = ledger
            .record_usage(&UserId::from(7), 3, ts("2024-01-01T00:00:00Z"))
            .await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
    }
}
