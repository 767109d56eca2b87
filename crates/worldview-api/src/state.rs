use std::sync::Arc;
use worldview_graph::Pipeline;
use worldview_persist::ThreadStore;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The pipeline is stateless between turns and created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        self.pipeline.store()
    }
}
