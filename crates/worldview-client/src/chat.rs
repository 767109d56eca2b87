use worldview_types::ChatMessage;

use crate::error::{ClientError, Result};
use crate::session::SessionStore;
use crate::storage::KeyValueStorage;
use crate::transport::{StreamClient, TurnHandle, TurnSnapshot};

pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Session store plus transport for one chat window
pub struct ChatSession<S: KeyValueStorage> {
    store: SessionStore<S>,
    client: StreamClient,
    thread_id: String,
    max_history: usize,
}

impl<S: KeyValueStorage> ChatSession<S> {
    pub fn new(store: SessionStore<S>, client: StreamClient) -> Result<Self> {
        let thread_id = store.thread_id()?;
        Ok(Self {
            store,
            client,
            thread_id,
            max_history: DEFAULT_MAX_HISTORY,
        })
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.store.load(&self.thread_id)
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Record the human message locally and start streaming the turn
    pub async fn submit(&mut self, input: &str) -> Result<TurnHandle> {
        if input.trim().is_empty() {
            return Err(ClientError::EmptyInput);
        }

        self.store
            .append(&self.thread_id, ChatMessage::human(input), self.max_history)?;
        self.client.invoke(input, Some(&self.thread_id)).await
    }

    /// Wait for the turn; on a clean `done` the stored history becomes the
    /// final update's messages, otherwise it is left as is.
    pub async fn complete(&mut self, mut handle: TurnHandle) -> Result<TurnSnapshot> {
        let snapshot = handle.finished().await;

        if snapshot.completed() {
            if let Some(latest) = &snapshot.latest {
                self.store.save(&self.thread_id, &latest.messages)?;
                tracing::debug!(
                    thread_id = %self.thread_id,
                    messages = latest.messages.len(),
                    "history replaced with final update"
                );
            }
        } else {
            tracing::debug!(thread_id = %self.thread_id, status = ?snapshot.status, "turn did not complete");
        }

        Ok(snapshot)
    }

    pub async fn cancel(&self) -> bool {
        self.client.cancel().await
    }

    /// Switch to a fresh thread; the old history stays in storage
    pub async fn new_thread(&mut self) -> Result<&str> {
        self.client.cancel().await;
        self.thread_id = self.store.new_thread()?;
        Ok(&self.thread_id)
    }
}
