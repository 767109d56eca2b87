use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::AgentEvent;
use crate::message::{ChatMessage, Role};
use crate::thread::{generate_thread_id, validate_thread_id, InvalidThreadId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("input must not be empty")]
    EmptyInput,

    #[error(transparent)]
    InvalidThreadId(#[from] InvalidThreadId),
}

/// A validated request to run one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInput {
    pub thread_id: String,
    pub input: String,
}

impl TurnInput {
    /// Validate a prompt and optional thread id; a fresh id is generated
    /// when none (or a blank one) is given.
    pub fn new(input: impl Into<String>, thread_id: Option<String>) -> Result<Self, InputError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(InputError::EmptyInput);
        }

        let thread_id = match thread_id.filter(|t| !t.trim().is_empty()) {
            Some(id) => {
                validate_thread_id(&id)?;
                id
            }
            None => generate_thread_id(),
        };

        Ok(Self { thread_id, input })
    }
}

/// State threaded through the stages of one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    pub thread_id: String,
    pub run_id: String,
    pub messages: Vec<ChatMessage>,
    pub user_input: String,
    pub output: String,
    pub images_output: Vec<String>,
}

impl TurnState {
    pub fn new(input: TurnInput, history: Vec<ChatMessage>) -> Self {
        Self {
            thread_id: input.thread_id,
            run_id: uuid::Uuid::new_v4().to_string(),
            messages: history,
            user_input: input.input,
            output: String::new(),
            images_output: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn has_system_prompt(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::System)
    }

    /// Wire snapshot of the current state
    pub fn snapshot(&self) -> AgentEvent {
        AgentEvent {
            messages: self.messages.clone(),
            output: self.output.clone(),
            images_output: self.images_output.clone(),
        }
    }
}
