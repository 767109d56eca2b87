mod llm_stage;
mod prepare_stage;

pub use llm_stage::LlmStage;
pub use prepare_stage::PrepareStage;
