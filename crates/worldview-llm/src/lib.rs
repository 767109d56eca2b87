pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;
pub mod azure_openai;
pub mod config;

pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, ChatStream, TokenUsage};

pub use streaming::{ChatStreamChunk, StreamEvent};
pub use buffer_utils::{decode_sse_stream, CircularLineBuffer, SseDecoder, SseFrame};
pub use openai::OpenAIClient;
pub use azure_openai::AzureOpenAIClient;
pub use config::{create_client, ClientFactory, ProviderConfig, ProviderType};
pub use types::{Content, ContentPart, Message};
