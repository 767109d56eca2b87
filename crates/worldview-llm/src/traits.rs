use crate::streaming::StreamEvent;
use crate::types::Message;
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Trait for chat-based LLM interactions (GPT-4o, etc)
///
/// Provides both streaming and non-streaming completions for conversational use cases.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Non-streaming chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Streaming chat completion
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Build the chat-completions JSON body shared by OpenAI and Azure.
///
/// Azure passes `include_model = false`: the deployment in the URL selects the model.
pub(crate) fn build_chat_payload(
    model: &str,
    include_model: bool,
    messages: &[Message],
    options: &ChatOptions,
    stream: bool,
) -> serde_json::Value {
    let wire: Vec<serde_json::Value> = messages.iter().map(Message::to_wire).collect();

    let mut body = serde_json::Map::new();
    if include_model {
        body.insert("model".into(), serde_json::json!(model));
    }
    body.insert("messages".into(), serde_json::json!(wire));
    body.insert("stream".into(), serde_json::json!(stream));

    // o1 and gpt-5 reject temperature and expect max_completion_tokens
    let is_reasoning_model = model.starts_with("o1") || model.starts_with("gpt-5");

    if let Some(temp) = options.temperature {
        if !is_reasoning_model {
            body.insert("temperature".into(), serde_json::json!(temp));
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        let field = if is_reasoning_model {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        body.insert(field.into(), serde_json::json!(max_tokens));
    }

    serde_json::Value::Object(body)
}
