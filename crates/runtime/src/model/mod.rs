//! Conversation messages and the chat-completion backend trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{Backend, History, Message, ModelRequest, ModelTurn, Role, ToolCallRequest};
