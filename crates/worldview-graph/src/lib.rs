pub mod builder;
pub mod pipeline;
pub mod prompts;
pub mod stage;
pub mod stages;

pub use builder::PipelineBuilder;
pub use pipeline::Pipeline;
pub use prompts::{PromptTemplates, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_TEMPLATE};
pub use stage::{EventSender, Stage, StageType};
pub use stages::{LlmStage, PrepareStage};

// Re-export key types from worldview-types
pub use worldview_types::{AgentEvent, GraphConfig, LLMConfig, StreamEvent, TurnInput, TurnState};
