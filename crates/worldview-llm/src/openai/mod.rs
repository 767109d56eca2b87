mod client;

pub use client::OpenAIClient;
pub(crate) use client::OpenAIChatResponse;
