//! Local key-value storage for transfer state and saved conversations.
//!
//! Everything lives in one JSON document with the keys `savedConversations`,
//! `currentConversation`, `isLimitReached` and `timestamp`. There is no
//! schema version; unknown keys are ignored and missing keys take defaults.

use crate::error::StoreError;
use crate::message::Transcript;
use crate::summary::text::take_chars;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Saved conversations kept, newest first.
pub const MAX_SAVED: usize = 10;

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedConversation {
    pub id: String,
    pub timestamp: String,
    pub message_count: usize,
    pub preview: String,
    pub conversation: Transcript,
}

impl SavedConversation {
    pub fn new(conversation: Transcript, now: DateTime<Utc>) -> Self {
        let preview = conversation
            .first()
            .map(|m| take_chars(&m.content, PREVIEW_CHARS).to_string())
            .unwrap_or_else(|| "No preview".to_string());
        Self {
            id: now.timestamp_millis().to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            message_count: conversation.len(),
            preview,
            conversation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageArea {
    pub saved_conversations: Vec<SavedConversation>,
    pub current_conversation: Option<Transcript>,
    pub is_limit_reached: bool,
    /// Milliseconds since the epoch of the last transfer stash.
    pub timestamp: Option<i64>,
}

/// JSON-file backed storage. A store without a path only lives in memory.
#[derive(Debug, Default)]
pub struct ConversationStore {
    path: Option<PathBuf>,
    area: StorageArea,
}

impl ConversationStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let area = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no storage at {:?}, starting empty", path);
                StorageArea::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self {
            path: Some(path),
            area,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn area(&self) -> &StorageArea {
        &self.area
    }

    pub fn saved(&self) -> &[SavedConversation] {
        &self.area.saved_conversations
    }

    /// Prepends a conversation, keeps the newest [`MAX_SAVED`] and returns
    /// the new id.
    pub fn save_conversation(
        &mut self,
        conversation: Transcript,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let mut entry = SavedConversation::new(conversation, now);
        // Two saves inside one millisecond would otherwise share an id.
        if let Some(newest) = self.area.saved_conversations.first() {
            if let Ok(previous) = newest.id.parse::<i64>() {
                if previous >= now.timestamp_millis() {
                    entry.id = (previous + 1).to_string();
                }
            }
        }
        let id = entry.id.clone();

        self.area.saved_conversations.insert(0, entry);
        self.area.saved_conversations.truncate(MAX_SAVED);
        self.persist()?;
        log::info!(
            "saved conversation {} ({} kept)",
            id,
            self.area.saved_conversations.len()
        );
        Ok(id)
    }

    /// Stashes the conversation being transferred.
    pub fn set_current(
        &mut self,
        conversation: Transcript,
        is_limit_reached: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.area.current_conversation = Some(conversation);
        self.area.is_limit_reached = is_limit_reached;
        self.area.timestamp = Some(now.timestamp_millis());
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.area)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

/// Default location: `<data dir>/chat-transfer/storage.json`.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chat-transfer")
        .join("storage.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use chrono::{Duration, TimeZone};

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn saved_entry_fields() {
        let long = "x".repeat(150);
        let entry = SavedConversation::new(
            vec![Message::user(long.as_str()), Message::assistant("ok")],
            at(1_700_000_000_123),
        );
        assert_eq!(entry.id, "1700000000123");
        assert_eq!(entry.timestamp, "2023-11-14T22:13:20.123Z");
        assert_eq!(entry.message_count, 2);
        assert_eq!(entry.preview, "x".repeat(100));
    }

    #[test]
    fn empty_conversation_has_placeholder_preview() {
        let entry = SavedConversation::new(Vec::new(), at(0));
        assert_eq!(entry.preview, "No preview");
    }

    #[test]
    fn list_is_bounded_and_newest_first() {
        let mut store = ConversationStore::in_memory();
        let start = at(1_000);
        for i in 0..25 {
            let now = start + Duration::seconds(i);
            store
                .save_conversation(vec![Message::user(format!("chat {i}"))], now)
                .unwrap();
            assert!(store.saved().len() <= MAX_SAVED);
        }
        let saved = store.saved();
        assert_eq!(saved.len(), MAX_SAVED);
        assert_eq!(saved[0].preview, "chat 24");
        assert_eq!(saved[9].preview, "chat 15");
        let ids: Vec<i64> = saved.iter().map(|s| s.id.parse().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn same_millisecond_saves_get_distinct_ids() {
        let mut store = ConversationStore::in_memory();
        let now = at(5_000);
        let a = store.save_conversation(vec![Message::user("a")], now).unwrap();
        let b = store.save_conversation(vec![Message::user("b")], now).unwrap();
        assert_eq!(a, "5000");
        assert_eq!(b, "5001");
    }

    #[test]
    fn state_survives_reopen_with_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = ConversationStore::open(&path).unwrap();
        assert!(store.saved().is_empty());
        store
            .save_conversation(vec![Message::user("persist me")], at(42))
            .unwrap();
        store
            .set_current(vec![Message::assistant("current")], true, at(43))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["savedConversations"][0]["messageCount"], 1);
        assert_eq!(raw["isLimitReached"], true);
        assert_eq!(raw["timestamp"], 43);

        let reopened = ConversationStore::open(&path).unwrap();
        assert_eq!(reopened.area(), store.area());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ConversationStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn unknown_and_missing_keys_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"isLimitReached": true, "somethingElse": 1}"#).unwrap();
        let store = ConversationStore::open(&path).unwrap();
        assert!(store.area().is_limit_reached);
        assert!(store.saved().is_empty());
    }
}
