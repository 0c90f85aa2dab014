use super::errors::ModelError;
use crate::schema::FunctionSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned identifier, echoed back on the matching tool message.
    pub id: String,
    pub name: String,
    /// Arguments exactly as the model produced them (JSON text, unparsed).
    pub arguments: String,
}

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Message {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// An assistant message requesting tool calls, with optional remark text.
    pub fn assistant_with_calls(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_call_id: None,
            tool_calls: calls,
        }
    }

    /// A tool result answering the call with the given id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Text content, or an empty string for call-only messages.
    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Ordered, append-only message history.
///
/// Messages can be pushed and read but never edited or removed. Tool messages
/// must answer a call id requested earlier by an assistant message.
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if a tool message does not answer an earlier
    /// tool call.
    pub fn push(&mut self, message: Message) {
        debug_assert!(
            message.role != Role::Tool || self.answers_known_call(&message),
            "tool message without a matching tool call: {message:?}"
        );
        self.messages.push(message);
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn answers_known_call(&self, message: &Message) -> bool {
        let Some(id) = message.tool_call_id.as_deref() else {
            return false;
        };
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .flat_map(|m| &m.tool_calls)
            .any(|call| call.id == id)
    }
}

/// What the model produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelTurn {
    /// A direct answer with no tool calls.
    TextAnswer { content: String },
    /// The model wants tools run before it can answer.
    ToolCallsRequested {
        /// Remark issued alongside the calls, if any.
        content: Option<String>,
        /// Calls in the order the model listed them.
        calls: Vec<ToolCallRequest>,
    },
}

impl ModelTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self::TextAnswer {
            content: content.into(),
        }
    }
}

/// Everything needed for a model request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub messages: &'a [Message],
    /// Function schemas offered to the model. `None` means no tools are
    /// offered and the model must answer in text.
    pub tools: Option<&'a [FunctionSchema]>,
}

/// Trait for chat-completion backends.
pub trait Backend: Send + Sync {
    /// Model identifier, for display.
    fn model(&self) -> &str;

    fn complete(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelTurn, ModelError>> + Send;
}
