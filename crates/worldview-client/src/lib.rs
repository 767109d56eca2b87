pub mod chat;
pub mod error;
pub mod session;
pub mod storage;
pub mod transport;

pub use chat::{ChatSession, DEFAULT_MAX_HISTORY};
pub use error::{ClientError, StorageError};
pub use session::SessionStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use transport::{StreamClient, TurnHandle, TurnSnapshot, TurnStatus};

pub use worldview_types::{AgentEvent, ChatMessage, Role};
