//! Step event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened in a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Session connected and tools were discovered.
    SessionStart { server: String, tools: Vec<String> },
    /// A request is about to be sent to the model.
    ModelRequest { messages: Value, tools: usize },
    /// The model answered.
    ModelResponse { response: Value },
    /// The model call failed.
    ModelError { message: String },
    /// A tool is about to be invoked.
    ToolCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    /// A tool returned.
    ToolResult {
        call_id: String,
        name: String,
        content: String,
        is_error: bool,
    },
    /// Session closed.
    SessionEnd,
}

impl EventKind {
    /// Short snake_case name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStart { .. } => "session_start",
            Self::ModelRequest { .. } => "model_request",
            Self::ModelResponse { .. } => "model_response",
            Self::ModelError { .. } => "model_error",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::SessionEnd => "session_end",
        }
    }
}

/// One recorded step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(session_id: SessionId, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_flattened_into_event() {
        let event = Event::new(
            SessionId::new(),
            EventKind::ToolCall {
                call_id: "c1".into(),
                name: "get_weather".into(),
                arguments: r#"{"city":"Paris"}"#.into(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "tool_call");
        assert_eq!(json["name"], "get_weather");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, event.kind);
    }

    #[test]
    fn tool_steps_read_back_from_text() {
        let event = Event::new(
            SessionId::new(),
            EventKind::ToolResult {
                call_id: "call_7".into(),
                name: "get_weather".into(),
                content: "22C, sunny".into(),
                is_error: false,
            },
        );
        let text = serde_json::to_string_pretty(&event).unwrap();
        assert_eq!(text.matches("\"id\"").count(), 1);

        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.kind, event.kind);
    }

    #[test]
    fn kind_names() {
        assert_eq!(EventKind::SessionEnd.name(), "session_end");
        assert_eq!(
            EventKind::ModelError {
                message: "down".into()
            }
            .name(),
            "model_error"
        );
    }
}
