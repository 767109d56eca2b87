use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::message::ChatMessage;

/// Snapshot of agent state pushed to the client during a turn
///
/// `messages` is cumulative: prior thread history plus everything this turn
/// has produced so far. The last snapshot before `done` is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AgentEvent {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub images_output: Vec<String>,
}

/// What a running turn sends to its transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Progress snapshot, framed as SSE `update`
    Update(AgentEvent),

    /// The turn failed; always followed by `Done`
    Error { message: String },

    /// Terminal sentinel; nothing follows it
    Done,
}

impl StreamEvent {
    /// SSE `event:` name
    pub fn event_name(&self) -> &'static str {
        match self {
            StreamEvent::Update(_) => "update",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done)
    }
}
