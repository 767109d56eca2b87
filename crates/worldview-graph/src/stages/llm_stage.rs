use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use worldview_llm::{ChatClient, ChatOptions, ChatRequest, Message, StreamEvent as LlmEvent};
use worldview_types::{ChatMessage, LLMConfig, StreamEvent, TurnState};

use crate::stage::{EventSender, Stage, StageType};

/// Calls the model with the full transcript and streams the reply into
/// `output`, pushing throttled `Update` snapshots along the way.
pub struct LlmStage {
    client: Arc<dyn ChatClient>,
    config: LLMConfig,
    update_interval: Duration,
}

impl LlmStage {
    pub fn new(client: Arc<dyn ChatClient>, config: LLMConfig) -> Self {
        Self {
            client,
            config,
            update_interval: Duration::ZERO,
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    fn build_request(&self, state: &TurnState) -> ChatRequest {
        let mut options = ChatOptions::new();
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        let messages: Vec<Message> = state.messages.iter().map(Message::from).collect();
        ChatRequest::new(self.config.model.clone(), messages).with_options(options)
    }

    fn due(&self, last_sent: Option<Instant>) -> bool {
        match last_sent {
            None => true,
            Some(at) => at.elapsed() >= self.update_interval,
        }
    }
}

#[async_trait]
impl Stage for LlmStage {
    async fn execute(&self, state: &mut TurnState, event_tx: EventSender) -> Result<()> {
        if state.messages.is_empty() {
            tracing::debug!("empty transcript, skipping model call");
            return Ok(());
        }

        tracing::info!(model = %self.config.model, messages = state.messages.len(), "calling model");
        let mut stream = self.client.chat_stream(self.build_request(state)).await?;
        let mut last_sent = None;
        let mut finished = false;

        while let Some(event) = stream.next().await {
            match event? {
                LlmEvent::Message { content } => {
                    if content.is_empty() {
                        continue;
                    }
                    state.output.push_str(&content);
                    if self.due(last_sent) {
                        event_tx.send(StreamEvent::Update(state.snapshot())).await?;
                        last_sent = Some(Instant::now());
                    }
                }
                LlmEvent::Done { finish_reason } => {
                    tracing::debug!(?finish_reason, chars = state.output.len(), "model stream finished");
                    finished = true;
                    break;
                }
            }
        }

        if !finished {
            bail!("model stream ended before completion");
        }

        state.images_output = extract_image_refs(&state.output);
        state.add_message(ChatMessage::ai(state.output.clone()));
        Ok(())
    }

    fn stage_type(&self) -> StageType {
        StageType::Llm
    }
}

/// URLs of markdown images (`![alt](url)`) in order of appearance, deduplicated
pub(crate) fn extract_image_refs(text: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("![") {
        rest = &rest[start + 2..];
        let Some(close) = rest.find("](") else { break };
        let after = &rest[close + 2..];
        let Some(end) = after.find(')') else { break };

        // drop an optional title: ![a](url "title")
        let url = after[..end].split_whitespace().next().unwrap_or_default();
        if !url.is_empty() && !refs.iter().any(|r| r == url) {
            refs.push(url.to_string());
        }
        rest = &after[end + 1..];
    }

    refs
}
