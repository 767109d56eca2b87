use anyhow::Result;
use futures::StreamExt;
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::buffer_utils::decode_sse_stream;
use crate::traits::ChatStream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Text delta of the assistant message
    Message { content: String },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

/// One `chat.completion.chunk` from the streaming endpoint
///
/// Azure prepends chunks with an empty `choices` array (content filter
/// results), so every field is lenient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn is_done(&self) -> bool {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_ref())
            .is_some()
    }

    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

/// Turn a streaming chat-completions response into [`StreamEvent`]s
///
/// Ends after the first `Done`, whether it came from a `finish_reason` or
/// the `[DONE]` sentinel.
pub fn parse_chat_sse_stream(response: Response) -> ChatStream {
    let mut frames = decode_sse_stream(response.bytes_stream());

    Box::pin(async_stream::stream! {
        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let data = frame.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                yield Ok(StreamEvent::Done { finish_reason: None });
                return;
            }

            match serde_json::from_str::<ChatStreamChunk>(data) {
                Ok(chunk) => {
                    for event in chunk.to_stream_events() {
                        let done = matches!(event, StreamEvent::Done { .. });
                        yield Ok(event);
                        if done {
                            return;
                        }
                    }
                }
                Err(e) => yield Err(anyhow::anyhow!("Failed to parse chat chunk: {}", e)),
            }
        }
    })
}
