// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed store.
//!
//! - Registry: one pretty-printed JSON document, replaced via temp file + rename
//! - Ledger: JSON lines, one [`UsageEvent`] per line, append-only

use super::{RegistrySnapshot, Store, StoreError};
use crate::models::{UsageEvent, UserId};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Store backed by a registry document and a JSON-lines ledger.
pub struct FileStore {
    registry_path: PathBuf,
    ledger_path: PathBuf,
    /// Serializes ledger appends so lines never interleave.
    append_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(registry_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            ledger_path: ledger_path.into(),
            append_lock: Mutex::new(()),
        }
    }

    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir).await?;
        tracing::info!(path = %data_dir.display(), "Opened data directory");
        Ok(Self::new(
            data_dir.join(crate::config::REGISTRY_FILE),
            data_dir.join(crate::config::LEDGER_FILE),
        ))
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }
}

#[async_trait]
impl Store for FileStore {
    async fn load_registry(&self) -> RegistrySnapshot {
        let data = match fs::read_to_string(&self.registry_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.registry_path.display(),
                    "No registry file, starting empty"
                );
                return RegistrySnapshot::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.registry_path.display(),
                    error = %e,
                    "Failed to read registry, starting empty"
                );
                return RegistrySnapshot::default();
            }
        };

        match decode_registry(&data) {
            Ok((snapshot, dropped)) => {
                if dropped > 0 {
                    tracing::warn!(dropped, "Dropped invalid registry entries");
                }
                tracing::info!(
                    whitelisted = snapshot.whitelist.len(),
                    blacklisted = snapshot.blacklist.len(),
                    pro = snapshot.pro_users.len(),
                    "Registry loaded"
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.registry_path.display(),
                    error = %e,
                    "Corrupt registry file, starting empty"
                );
                RegistrySnapshot::default()
            }
        }
    }

    async fn save_registry(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.registry_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write next to the target so the rename stays on one filesystem
        let tmp_path = self.registry_path.with_extension("json.tmp");
        fs::write(&tmp_path, &body).await?;
        fs::rename(&tmp_path, &self.registry_path).await?;

        tracing::debug!(path = %self.registry_path.display(), "Registry saved");
        Ok(())
    }

    async fn append_usage_event(&self, event: &UsageEvent) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self.append_lock.lock().await;
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.ledger_path)
            .await?;

        // A crash can leave a partial record with no newline; start a fresh
        // line so the new event does not get glued onto it.
        if ends_mid_line(&mut file).await? {
            tracing::warn!(
                path = %self.ledger_path.display(),
                "Usage ledger ended mid-line, terminating torn record"
            );
            line.insert(0, b'\n');
        }

        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    fn scan_usage_events(&self, user_id: &UserId) -> BoxStream<'static, UsageEvent> {
        let path = self.ledger_path.clone();
        let user_id = user_id.clone();

        stream::unfold(ScanState::Pending(path), move |state| {
            let user_id = user_id.clone();
            async move {
                let mut reader = match state {
                    ScanState::Pending(path) => match File::open(&path).await {
                        Ok(file) => BufReader::new(file),
                        Err(e) => {
                            if e.kind() != std::io::ErrorKind::NotFound {
                                tracing::warn!(error = %e, "Failed to open usage ledger");
                            }
                            return None;
                        }
                    },
                    ScanState::Reading(reader) => reader,
                };

                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf).await {
                        Ok(0) => return None,
                        Ok(_) => {
                            if let Some(event) = decode_event(&buf) {
                                if event.user_id == user_id {
                                    return Some((event, ScanState::Reading(reader)));
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to read usage ledger");
                            return None;
                        }
                    }
                }
            }
        })
        .boxed()
    }
}

/// True when the file is non-empty and its last byte is not a newline.
async fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

enum ScanState {
    Pending(PathBuf),
    Reading(BufReader<File>),
}

/// Parse one ledger line, skipping blanks and malformed records.
fn decode_event(line: &[u8]) -> Option<UsageEvent> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_slice(trimmed) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed ledger line");
            None
        }
    }
}

/// Loosely typed registry document, validated entry by entry.
#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default)]
    whitelist: serde_json::Map<String, Value>,
    #[serde(default)]
    blacklist: Vec<Value>,
    #[serde(default)]
    pro_users: Vec<Value>,
}

/// Decode a registry document. Returns the snapshot and the number of
/// entries dropped for failing validation.
fn decode_registry(data: &str) -> Result<(RegistrySnapshot, usize), serde_json::Error> {
    let raw: RawRegistry = serde_json::from_str(data)?;
    let mut snapshot = RegistrySnapshot::default();
    let mut dropped = 0;

    for (key, value) in raw.whitelist {
        let user = UserId::parse(&key);
        let date = value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        match (user, date) {
            (Some(user), Some(date)) => {
                snapshot.whitelist.insert(user, date);
            }
            _ => dropped += 1,
        }
    }

    for value in raw.blacklist {
        match user_from_value(&value) {
            Some(user) => {
                snapshot.blacklist.insert(user);
            }
            None => dropped += 1,
        }
    }

    for value in raw.pro_users {
        match user_from_value(&value) {
            Some(user) => {
                snapshot.pro_users.insert(user);
            }
            None => dropped += 1,
        }
    }

    Ok((snapshot, dropped))
}

fn user_from_value(value: &Value) -> Option<UserId> {
    match value {
        Value::String(s) => UserId::parse(s),
        Value::Number(n) => n.as_u64().map(UserId::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_registry_drops_invalid_entries() {
        let data = r#"{
            "whitelist": { "7": "2024-01-01", "8": "not-a-date", " ": "2024-01-01" },
            "blacklist": ["9", 10, null, ""],
            "pro_users": [11, {"id": 12}]
        }"#;

        let (snapshot, dropped) = decode_registry(data).unwrap();

        assert_eq!(snapshot.whitelist.len(), 1);
        assert_eq!(
            snapshot.whitelist.get(&UserId::from(7)),
            NaiveDate::from_ymd_opt(2024, 1, 1).as_ref()
        );
        assert!(snapshot.blacklist.contains(&UserId::from(9)));
        assert!(snapshot.blacklist.contains(&UserId::from(10)));
        assert_eq!(snapshot.pro_users.len(), 1);
        assert_eq!(dropped, 5);
    }

    #[test]
    fn test_decode_registry_missing_sections_default() {
        let (snapshot, dropped) = decode_registry("{}").unwrap();
        assert_eq!(snapshot, RegistrySnapshot::default());
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_decode_registry_rejects_wrong_shape() {
        assert!(decode_registry(r#"{ "whitelist": [1, 2] }"#).is_err());
        assert!(decode_registry("not json").is_err());
    }

    #[test]
    fn test_decode_event_skips_garbage() {
        assert!(decode_event(b"\n").is_none());
        assert!(decode_event(b"{\"timestamp\":").is_none());
        assert!(decode_event(&[0xff, 0xfe, b'\n']).is_none());

        let event = decode_event(
            b"{\"timestamp\":\"2024-01-01T10:00:00Z\",\"user_id\":\"7\",\"token_count\":120}\n",
        )
        .unwrap();
        assert_eq!(event.user_id, UserId::from(7));
        assert_eq!(event.token_count, 120);
    }
}
