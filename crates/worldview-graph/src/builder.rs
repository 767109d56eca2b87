use anyhow::{anyhow, Result};
use std::sync::Arc;
use worldview_llm::ChatClient;
use worldview_persist::{MemoryThreadStore, ThreadStore};
use worldview_types::{GraphConfig, LLMConfig};

use crate::pipeline::Pipeline;
use crate::prompts::PromptTemplates;
use crate::stage::Stage;
use crate::stages::{LlmStage, PrepareStage};

/// Builder for a [`Pipeline`]
///
/// By default the pipeline is `prepare -> llm`, which needs an LLM client.
/// `stages` replaces that list outright.
pub struct PipelineBuilder {
    llm_client: Option<Arc<dyn ChatClient>>,
    llm_config: LLMConfig,
    prompts: PromptTemplates,
    store: Option<Arc<dyn ThreadStore>>,
    config: GraphConfig,
    stages: Option<Vec<Arc<dyn Stage>>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            llm_client: None,
            llm_config: LLMConfig::default(),
            prompts: PromptTemplates::default(),
            store: None,
            config: GraphConfig::default(),
            stages: None,
        }
    }

    pub fn llm_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    pub fn llm_config(mut self, config: LLMConfig) -> Self {
        self.llm_config = config;
        self
    }

    pub fn prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    /// Thread store; an in-memory store is used when none is set
    pub fn store(mut self, store: Arc<dyn ThreadStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stages(mut self, stages: Vec<Arc<dyn Stage>>) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let stages = match self.stages {
            Some(stages) if stages.is_empty() => return Err(anyhow!("at least one stage is required")),
            Some(stages) => stages,
            None => {
                let client = self
                    .llm_client
                    .ok_or_else(|| anyhow!("LLM client is required"))?;
                let llm = LlmStage::new(client, self.llm_config)
                    .with_update_interval(self.config.update_interval);
                vec![
                    Arc::new(PrepareStage::new(self.prompts)) as Arc<dyn Stage>,
                    Arc::new(llm),
                ]
            }
        };

        let store = self.store.unwrap_or_else(|| {
            tracing::debug!("no thread store configured, using in-memory store");
            Arc::new(MemoryThreadStore::new())
        });

        Ok(Pipeline::new(stages, store, self.config))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
