use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use worldview_types::{validate_thread_id, ChatMessage};

use crate::error::Result;
use crate::models::ThreadRecord;
use crate::trait_store::ThreadStore;

/// Process-local store; history is lost on restart
#[derive(Default)]
pub struct MemoryThreadStore {
    threads: RwLock<HashMap<String, ThreadRecord>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        validate_thread_id(thread_id)?;
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<ThreadRecord> {
        validate_thread_id(thread_id)?;
        let mut threads = self.threads.write().await;
        let record = ThreadRecord::committed(threads.get(thread_id), thread_id, messages);
        threads.insert(thread_id.to_string(), record.clone());
        Ok(record)
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        validate_thread_id(thread_id)?;
        Ok(self.threads.write().await.remove(thread_id).is_some())
    }

    async fn list_threads(&self, limit: usize) -> Result<Vec<ThreadRecord>> {
        let mut all: Vec<ThreadRecord> = self.threads.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all.truncate(limit);
        Ok(all)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
