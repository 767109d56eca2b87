pub mod config;
pub mod events;
pub mod message;
pub mod state;
pub mod thread;

pub use config::{GraphConfig, LLMConfig};
pub use events::{AgentEvent, StreamEvent};
pub use message::{ChatMessage, Role};
pub use state::{InputError, TurnInput, TurnState};
pub use thread::{generate_thread_id, validate_thread_id, InvalidThreadId, MAX_THREAD_ID_LEN};
