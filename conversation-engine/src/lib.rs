pub mod engine;
pub mod llm;
pub mod notify;
pub mod persona;
pub mod prompt;
pub mod tools;

pub use engine::{
    ChatRole, ChatTurn, ConversationEngine, ConversationState, EngineOptions, ADMIN_COMMAND,
    ADMIN_CONFIRMATION, GENERIC_FAILURE_REPLY,
};
pub use llm::{ChatBackend, ModelTurn, OpenAiChatBackend};
pub use notify::{DisabledSink, NotificationSink, PushoverSink};
pub use persona::Persona;
pub use tools::{Tool, ToolDispatcher, ToolOutcome};
