//! Translation of server tool definitions into function-calling schemas.

use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The function envelope a chat-completion API expects in its `tools` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

/// Name, description and parameter schema of a callable function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl FunctionSchema {
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

impl From<&ToolDefinition> for FunctionSchema {
    /// The input schema is passed through verbatim.
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

/// Translate every definition, preserving order.
pub fn translate(tools: &[ToolDefinition]) -> Vec<FunctionSchema> {
    tools.iter().map(FunctionSchema::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "get_weather".into(),
                description: "Current weather for a city".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"]
                }),
            },
            ToolDefinition {
                name: "odd".into(),
                description: String::new(),
                input_schema: json!("not a schema at all"),
            },
        ]
    }

    #[test]
    fn mirrors_each_definition() {
        let tools = definitions();
        let schemas = translate(&tools);

        assert_eq!(schemas.len(), tools.len());
        for (tool, schema) in tools.iter().zip(&schemas) {
            assert_eq!(schema.kind, "function");
            assert_eq!(schema.function.name, tool.name);
            assert_eq!(schema.function.description, tool.description);
            assert_eq!(schema.function.parameters, tool.input_schema);
        }
    }

    #[test]
    fn translation_is_deterministic() {
        let tools = definitions();
        assert_eq!(translate(&tools), translate(&tools));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(translate(&[]).is_empty());
    }

    #[test]
    fn wire_shape() {
        let schema = FunctionSchema::from(&definitions()[0]);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "get_weather");
        assert_eq!(json["function"]["parameters"]["required"], json!(["city"]));
    }
}
