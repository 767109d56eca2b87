use serde::{Deserialize, Serialize};
use worldview_types::{generate_thread_id, validate_thread_id, ChatMessage};

use crate::error::StorageResult;
use crate::storage::KeyValueStorage;

pub const HISTORY_VERSION: u32 = 1;
pub const THREAD_ID_KEY: &str = "thread_id";

fn history_key(thread_id: &str) -> String {
    format!("history:{}", thread_id)
}

#[derive(Serialize)]
struct StoredHistoryRef<'a> {
    version: u32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Versioned {
        version: u32,
        messages: Vec<ChatMessage>,
    },
    /// Unversioned bare array written by older clients
    Legacy(Vec<ChatMessage>),
}

/// Per-thread chat history and the current thread token, kept in local storage
pub struct SessionStore<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Stored history, or empty when missing, unreadable or corrupt
    pub fn load(&self, thread_id: &str) -> Vec<ChatMessage> {
        let raw = match self.storage.get(&history_key(thread_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "history read failed");
                return Vec::new();
            }
        };

        match serde_json::from_str::<StoredHistory>(&raw) {
            Ok(StoredHistory::Versioned { version, messages }) if version == HISTORY_VERSION => {
                messages
            }
            Ok(StoredHistory::Versioned { version, .. }) => {
                tracing::warn!(thread_id, version, "unsupported history version, ignoring");
                Vec::new()
            }
            Ok(StoredHistory::Legacy(messages)) => messages,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "corrupt history, ignoring");
                Vec::new()
            }
        }
    }

    pub fn save(&self, thread_id: &str, messages: &[ChatMessage]) -> StorageResult<()> {
        let stored = StoredHistoryRef {
            version: HISTORY_VERSION,
            messages,
        };
        self.storage
            .set(&history_key(thread_id), &serde_json::to_string(&stored)?)
    }

    /// Push `message` and keep only the newest `max` entries (0 keeps all)
    pub fn append(
        &self,
        thread_id: &str,
        message: ChatMessage,
        max: usize,
    ) -> StorageResult<Vec<ChatMessage>> {
        let mut messages = self.load(thread_id);
        messages.push(message);

        if max > 0 && messages.len() > max {
            let excess = messages.len() - max;
            messages.drain(..excess);
        }

        self.save(thread_id, &messages)?;
        Ok(messages)
    }

    pub fn clear(&self, thread_id: &str) -> StorageResult<()> {
        self.storage.remove(&history_key(thread_id))
    }

    /// Current thread token, created and persisted on first use
    pub fn thread_id(&self) -> StorageResult<String> {
        match self.storage.get(THREAD_ID_KEY) {
            Ok(Some(id)) if validate_thread_id(&id).is_ok() => return Ok(id),
            Ok(Some(id)) => tracing::warn!(thread_id = %id, "stored thread id is invalid, replacing"),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "thread id read failed, replacing"),
        }
        self.new_thread()
    }

    pub fn new_thread(&self) -> StorageResult<String> {
        let id = generate_thread_id();
        self.storage.set(THREAD_ID_KEY, &id)?;
        Ok(id)
    }
}
