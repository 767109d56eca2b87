use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use worldview_llm::decode_sse_stream;
use worldview_types::{validate_thread_id, AgentEvent};

use crate::error::{ClientError, Result};

pub const THREAD_ID_HEADER: &str = "x-thread-id";

/// Where a streamed turn stands from the client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Streaming,
    /// Server sent `done`
    Done,
    /// Transport failed, non-2xx response, or EOF without `done`
    Closed,
    /// Closed by `cancel()`
    Cancelled,
    /// Closed because a newer `invoke` replaced it
    Superseded,
}

impl TurnStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TurnStatus::Streaming)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnSnapshot {
    /// Thread the server ran the turn on
    pub thread_id: Option<String>,
    pub latest: Option<AgentEvent>,
    pub status: TurnStatus,
    pub error: Option<String>,
}

impl TurnSnapshot {
    fn streaming(thread_id: Option<String>) -> Self {
        Self {
            thread_id,
            latest: None,
            status: TurnStatus::Streaming,
            error: None,
        }
    }

    /// Ended with `done` and no `error`
    pub fn completed(&self) -> bool {
        self.status == TurnStatus::Done && self.error.is_none()
    }
}

/// Caller's view of one invocation
pub struct TurnHandle {
    state: watch::Receiver<TurnSnapshot>,
}

impl TurnHandle {
    pub fn snapshot(&self) -> TurnSnapshot {
        self.state.borrow().clone()
    }

    pub fn latest(&self) -> Option<AgentEvent> {
        self.state.borrow().latest.clone()
    }

    pub fn status(&self) -> TurnStatus {
        self.state.borrow().status
    }

    /// Wait for the next change; false once nothing more can change
    pub async fn changed(&mut self) -> bool {
        if self.status().is_finished() {
            return false;
        }
        self.state.changed().await.is_ok()
    }

    /// Wait until the turn leaves `Streaming`
    pub async fn finished(&mut self) -> TurnSnapshot {
        if let Ok(snapshot) = self.state.wait_for(|s| s.status.is_finished()).await {
            return snapshot.clone();
        }
        self.state.borrow().clone()
    }
}

struct ActiveStream {
    task: JoinHandle<()>,
    state: Arc<watch::Sender<TurnSnapshot>>,
}

impl ActiveStream {
    /// Abort the reader and wait for it to stop
    async fn stop(mut self, status: TurnStatus) -> bool {
        self.task.abort();
        let _ = (&mut self.task).await;
        self.mark(status)
    }

    fn mark(&self, status: TurnStatus) -> bool {
        let mut stopped = false;
        self.state.send_if_modified(|s| {
            if s.status.is_finished() {
                return false;
            }
            s.status = status;
            stopped = true;
            true
        });
        stopped
    }
}

// A dropped client must not leave the connection open
impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.task.abort();
        self.mark(TurnStatus::Closed);
    }
}

/// Streaming transport: at most one open connection at a time
pub struct StreamClient {
    http: reqwest::Client,
    base_url: String,
    active: Mutex<Option<ActiveStream>>,
}

impl StreamClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            active: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a stream for one turn, closing the previous one first
    pub async fn invoke(&self, input: &str, thread_id: Option<&str>) -> Result<TurnHandle> {
        if input.trim().is_empty() {
            return Err(ClientError::EmptyInput);
        }
        if let Some(id) = thread_id {
            validate_thread_id(id)?;
        }

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            if previous.stop(TurnStatus::Superseded).await {
                tracing::debug!("previous stream superseded");
            }
        }

        let mut query = vec![("input", input)];
        if let Some(id) = thread_id {
            query.push(("thread_id", id));
        }
        let request = self
            .http
            .get(format!("{}/api/agent/stream", self.base_url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .query(&query);

        let (tx, rx) = watch::channel(TurnSnapshot::streaming(thread_id.map(str::to_string)));
        let state = Arc::new(tx);
        let task = tokio::spawn(read_stream(request, Arc::clone(&state)));

        *active = Some(ActiveStream { task, state });
        Ok(TurnHandle { state: rx })
    }

    /// Force-close the open stream; false when nothing was streaming
    ///
    /// Advisory only: work the server already committed stays committed.
    pub async fn cancel(&self) -> bool {
        match self.active.lock().await.take() {
            Some(stream) => stream.stop(TurnStatus::Cancelled).await,
            None => false,
        }
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(alias = "error")]
    message: String,
}

fn error_message(data: &str) -> String {
    serde_json::from_str::<ErrorPayload>(data)
        .map(|p| p.message)
        .unwrap_or_else(|_| data.to_string())
}

async fn read_stream(request: reqwest::RequestBuilder, state: Arc<watch::Sender<TurnSnapshot>>) {
    let close = |error: Option<String>| {
        state.send_modify(|s| {
            s.status = TurnStatus::Closed;
            if error.is_some() {
                s.error = error;
            }
        });
    };

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "stream connection failed");
            close(None);
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "stream rejected by server");
        close(Some(error_message(&body)));
        return;
    }

    if let Some(id) = response
        .headers()
        .get(THREAD_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        let id = id.to_string();
        state.send_modify(|s| s.thread_id = Some(id));
    }

    let mut frames = decode_sse_stream(response.bytes_stream());
    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "stream interrupted");
                break;
            }
        };

        match frame.event_name() {
            "update" => match serde_json::from_str::<AgentEvent>(&frame.data) {
                Ok(event) => state.send_modify(|s| s.latest = Some(event)),
                Err(e) => tracing::debug!(error = %e, "skipping unparseable update"),
            },
            "error" => {
                let message = error_message(&frame.data);
                state.send_modify(|s| s.error = Some(message));
            }
            "done" => {
                state.send_modify(|s| s.status = TurnStatus::Done);
                return;
            }
            other => tracing::trace!(event = other, "ignoring event"),
        }
    }

    close(None);
}
