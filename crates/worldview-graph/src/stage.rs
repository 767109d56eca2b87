use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use worldview_types::{StreamEvent, TurnState};

pub type EventSender = mpsc::Sender<StreamEvent>;

/// One typed step of the turn pipeline
///
/// A stage mutates the turn state and may push intermediate `Update`s; the
/// pipeline itself sends a snapshot after every stage.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn execute(&self, state: &mut TurnState, event_tx: EventSender) -> Result<()>;

    fn stage_type(&self) -> StageType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageType {
    Prepare,
    Llm,
    Custom(&'static str),
}

impl StageType {
    pub fn name(&self) -> &'static str {
        match self {
            StageType::Prepare => "prepare",
            StageType::Llm => "llm",
            StageType::Custom(name) => name,
        }
    }
}
