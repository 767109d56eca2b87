use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use worldview_types::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of commits to this thread
    #[serde(default)]
    pub turns: u64,
}

impl ThreadRecord {
    /// Record produced by committing `messages` on top of `previous`
    pub fn committed(
        previous: Option<&ThreadRecord>,
        thread_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.to_string(),
            messages,
            created_at: previous.map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
            turns: previous.map(|p| p.turns + 1).unwrap_or(1),
        }
    }
}
