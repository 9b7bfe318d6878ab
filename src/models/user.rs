// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User identity and membership view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-assigned user identifier.
///
/// Chat platforms hand out integer snowflakes, admin commands pass them back
/// as strings. Both normalise to the same trimmed string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Build an identifier, rejecting blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the registry knows about one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub user_id: UserId,
    /// Grants access to pro-tier models
    pub is_pro: bool,
    /// Date of the most recent whitelist grant, `None` while blacklisted
    pub whitelisted_since: Option<NaiveDate>,
    pub is_blacklisted: bool,
}

impl UserRecord {
    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted_since.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(UserId::parse(" 42 "), Some(UserId::from(42)));
        assert_eq!(UserId::parse("   "), None);
        assert_eq!(UserId::parse(""), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from(7)).unwrap();
        assert_eq!(json, "\"7\"");
    }
}
