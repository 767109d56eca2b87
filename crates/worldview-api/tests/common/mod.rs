#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use worldview_api::{build_router, config::Config, state::AppState};
use worldview_graph::{GraphConfig, Pipeline};
use worldview_llm::{ChatClient, ChatRequest, ChatResponse, ChatStream, StreamEvent};
use worldview_persist::{MemoryThreadStore, ThreadStore};

/// Stands in for the model: replays deltas, optionally slowly or failing
pub struct ScriptedClient {
    pub deltas: Vec<String>,
    pub delay: Duration,
    pub fail: bool,
}

impl ScriptedClient {
    pub fn answering(text: &str) -> Self {
        Self {
            deltas: text.split_inclusive(' ').map(str::to_string).collect(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn slow(deltas: usize, delay: Duration) -> Self {
        Self {
            deltas: (0..deltas).map(|i| format!("chunk{} ", i)).collect(),
            delay,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            deltas: Vec::new(),
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
        bail!("not used")
    }

    async fn chat_stream(&self, _request: ChatRequest) -> Result<ChatStream> {
        if self.fail {
            bail!("OpenAI API error (500): upstream unavailable");
        }
        let deltas = self.deltas.clone();
        let delay = self.delay;
        Ok(Box::pin(async_stream::stream! {
            for delta in deltas {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(StreamEvent::Message { content: delta });
            }
            yield Ok(StreamEvent::Done { finish_reason: Some("stop".to_string()) });
        }))
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<dyn ThreadStore>,
}

pub fn test_app(client: ScriptedClient) -> TestApp {
    test_app_with(client, GraphConfig::default())
}

pub fn test_app_with(client: ScriptedClient, graph_config: GraphConfig) -> TestApp {
    let store: Arc<dyn ThreadStore> = Arc::new(MemoryThreadStore::new());
    let pipeline = Pipeline::builder()
        .llm_client(Arc::new(client))
        .store(Arc::clone(&store))
        .config(graph_config)
        .build()
        .unwrap();

    let config = Config::defaults().unwrap();
    TestApp {
        state: Arc::new(AppState::new(config, pipeline)),
        store,
    }
}

/// Serve the app on an ephemeral local port; returns `host:port`
pub async fn serve(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(app.state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}
