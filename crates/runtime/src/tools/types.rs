//! Tool-related types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing accepted arguments.
    pub input_schema: Value,
}

impl From<mcp::Tool> for ToolDefinition {
    fn from(tool: mcp::Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

/// Raw payload returned by a tool server.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Structured(Value),
}

impl ToolOutput {
    /// Text passes through; structured payloads are serialized as JSON.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured(value) => value.to_string(),
        }
    }
}

/// Outcome of a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { content: String },
    Failure { message: String },
}

/// Result of a tool execution, paired with the call id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome: ToolOutcome::Success {
                content: content.into(),
            },
        }
    }

    pub fn failure(tool_call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome: ToolOutcome::Failure {
                message: message.into(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Failure { .. })
    }

    /// Text stored in the tool message: the content, or `error: <message>`.
    pub fn history_content(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { content } => content.clone(),
            ToolOutcome::Failure { message } => format!("error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_output_is_serialized() {
        let output = ToolOutput::Structured(json!({"temp": 22}));
        assert_eq!(output.into_text(), r#"{"temp":22}"#);
        assert_eq!(ToolOutput::Text("22C".into()).into_text(), "22C");
    }

    #[test]
    fn history_content_marks_failures() {
        assert_eq!(ToolCallResult::success("c1", "ok").history_content(), "ok");
        let failed = ToolCallResult::failure("c2", "tool not found: x");
        assert!(failed.is_failure());
        assert_eq!(failed.history_content(), "error: tool not found: x");
    }

    #[test]
    fn missing_description_becomes_empty() {
        let tool: mcp::Tool = serde_json::from_value(json!({
            "name": "ping",
            "inputSchema": {"type": "object"}
        }))
        .unwrap();
        let definition = ToolDefinition::from(tool);
        assert_eq!(definition.description, "");
    }
}
