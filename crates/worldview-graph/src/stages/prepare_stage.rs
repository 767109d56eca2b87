use anyhow::Result;
use async_trait::async_trait;
use worldview_types::{ChatMessage, TurnState};

use crate::prompts::PromptTemplates;
use crate::stage::{EventSender, Stage, StageType};

/// Seeds the transcript for the turn: system prompt once per thread, then
/// the rendered user message. Clears output left over from earlier turns.
pub struct PrepareStage {
    prompts: PromptTemplates,
}

impl PrepareStage {
    pub fn new(prompts: PromptTemplates) -> Self {
        Self { prompts }
    }
}

impl Default for PrepareStage {
    fn default() -> Self {
        Self::new(PromptTemplates::default())
    }
}

#[async_trait]
impl Stage for PrepareStage {
    async fn execute(&self, state: &mut TurnState, _event_tx: EventSender) -> Result<()> {
        if !state.has_system_prompt() {
            state.add_message(ChatMessage::system(self.prompts.system_prompt()));
        }

        let human = self.prompts.render_user(&state.user_input);
        let human = human.trim();
        if !human.is_empty() {
            state.add_message(ChatMessage::human(human));
        }

        state.output.clear();
        state.images_output.clear();

        tracing::debug!(messages = state.messages.len(), "transcript prepared");
        Ok(())
    }

    fn stage_type(&self) -> StageType {
        StageType::Prepare
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use worldview_types::{Role, TurnInput};

    fn state(input: &str, history: Vec<ChatMessage>) -> TurnState {
        TurnState::new(TurnInput::new(input, Some("t1".into())).unwrap(), history)
    }

    #[tokio::test]
    async fn test_first_turn_adds_system_and_human() {
        let (tx, _rx) = mpsc::channel(4);
        let mut state = state("show wildfires", vec![]);
        state.output = "stale".into();
        state.images_output = vec!["old.png".into()];

        PrepareStage::default().execute(&mut state, tx).await.unwrap();

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::System);
        assert_eq!(state.messages[1], ChatMessage::human("show wildfires"));
        assert!(state.output.is_empty());
        assert!(state.images_output.is_empty());
    }

    #[tokio::test]
    async fn test_existing_system_prompt_not_duplicated() {
        let (tx, _rx) = mpsc::channel(4);
        let history = vec![
            ChatMessage::system("sys"),
            ChatMessage::human("first"),
            ChatMessage::ai("answer"),
        ];
        let mut state = state("second", history);

        PrepareStage::default().execute(&mut state, tx).await.unwrap();

        let systems = state.messages.iter().filter(|m| m.role == Role::System).count();
        assert_eq!(systems, 1);
        assert_eq!(state.last_message(), Some(&ChatMessage::human("second")));
    }

    #[tokio::test]
    async fn test_template_applied() {
        let (tx, _rx) = mpsc::channel(4);
        let stage = PrepareStage::new(PromptTemplates::new("sys", "Q: {input}"));
        let mut state = state("dust over Sahara", vec![]);

        stage.execute(&mut state, tx).await.unwrap();

        assert_eq!(state.messages[0], ChatMessage::system("sys"));
        assert_eq!(state.messages[1].content, "Q: dust over Sahara");
    }
}
