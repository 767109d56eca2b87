use async_trait::async_trait;
use worldview_types::ChatMessage;

use crate::error::Result;
use crate::models::ThreadRecord;

/// Server-owned conversation state keyed by thread id
///
/// Implementations validate the thread id before touching storage.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Committed history of a thread, if any
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadRecord>>;

    /// Replace the thread's history with `messages` (last writer wins)
    async fn save(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<ThreadRecord>;

    /// Remove a thread; `false` when it did not exist
    async fn delete(&self, thread_id: &str) -> Result<bool>;

    /// Most recently updated threads first
    async fn list_threads(&self, limit: usize) -> Result<Vec<ThreadRecord>>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}
