use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use worldview_types::ChatMessage;

use crate::models::ThreadRecord;

/// MongoDB document for a thread; the thread id is the primary key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub turns: u64,
}

impl From<ThreadRecord> for MongoThread {
    fn from(record: ThreadRecord) -> Self {
        Self {
            id: record.thread_id,
            messages: record.messages,
            created_at: record.created_at,
            updated_at: record.updated_at,
            turns: record.turns,
        }
    }
}

impl From<MongoThread> for ThreadRecord {
    fn from(doc: MongoThread) -> Self {
        Self {
            thread_id: doc.id,
            messages: doc.messages,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            turns: doc.turns,
        }
    }
}
