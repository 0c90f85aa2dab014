//! Discovered tools and the single entry point for executing them.

use super::{ToolCallResult, ToolDefinition, ToolError, ToolServer, validate};
use crate::model::ToolCallRequest;
use crate::schema::{self, FunctionSchema};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// The tools one server offers, fixed at discovery.
///
/// [`invoke`](Self::invoke) never fails: every error becomes a failure
/// outcome for the model to read.
#[derive(Debug)]
pub struct ToolGateway<S> {
    server: S,
    tools: Vec<ToolDefinition>,
    schemas: Vec<FunctionSchema>,
}

impl<S: ToolServer> ToolGateway<S> {
    /// List the server's tools once and translate them into function schemas.
    pub async fn discover(server: S) -> Result<Self> {
        let tools = server
            .list_tools()
            .await
            .map_err(|e| Error::Discovery(format!("{}: {e}", server.name())))?;

        {
            let mut seen = HashSet::new();
            if let Some(dup) = tools.iter().find(|t| !seen.insert(t.name.as_str())) {
                return Err(Error::Discovery(format!(
                    "{} advertises `{}` more than once",
                    server.name(),
                    dup.name
                )));
            }
        }

        let schemas = schema::translate(&tools);
        info!(server = %server.name(), tools = tools.len(), "tools discovered");

        Ok(Self {
            server,
            tools,
            schemas,
        })
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Function schemas in discovery order.
    pub fn schemas(&self) -> &[FunctionSchema] {
        &self.schemas
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn into_server(self) -> S {
        self.server
    }

    /// Execute one requested call.
    pub async fn invoke(&self, call: &ToolCallRequest) -> ToolCallResult {
        match self.try_invoke(call).await {
            Ok(content) => {
                debug!(tool = %call.name, id = %call.id, "tool call succeeded");
                ToolCallResult::success(&call.id, content)
            }
            Err(e) => {
                warn!(tool = %call.name, id = %call.id, error = %e, "tool call failed");
                ToolCallResult::failure(&call.id, e.to_string())
            }
        }
    }

    async fn try_invoke(&self, call: &ToolCallRequest) -> std::result::Result<String, ToolError> {
        let arguments = parse_arguments(&call.arguments)?;

        let tool = self
            .tools
            .iter()
            .find(|t| t.name == call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let arguments =
            validate(&tool.input_schema, arguments).map_err(ToolError::InvalidArguments)?;

        let output = self
            .server
            .call_tool(&tool.name, arguments)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        Ok(output.into_text())
    }
}

/// Parse argument text; blank text means no arguments.
fn parse_arguments(text: &str) -> std::result::Result<Value, ToolError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text)
        .map_err(|e| ToolError::InvalidArguments(format!("not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ServerError, ToolOutcome, ToolOutput};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeServer {
        tools: Vec<ToolDefinition>,
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl FakeServer {
        fn weather() -> Self {
            Self {
                tools: vec![
                    ToolDefinition {
                        name: "get_weather".into(),
                        description: "Current weather".into(),
                        input_schema: json!({
                            "type": "object",
                            "properties": {"city": {"type": "string"}},
                            "required": ["city"]
                        }),
                    },
                    ToolDefinition {
                        name: "forecast".into(),
                        description: String::new(),
                        input_schema: json!({"type": "object"}),
                    },
                    ToolDefinition {
                        name: "broken".into(),
                        description: String::new(),
                        input_schema: json!({"type": "object"}),
                    },
                ],
                ..Default::default()
            }
        }
    }

    impl ToolServer for FakeServer {
        fn name(&self) -> &str {
            "fake"
        }

        async fn list_tools(&self) -> std::result::Result<Vec<ToolDefinition>, ServerError> {
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Map<String, Value>,
        ) -> std::result::Result<ToolOutput, ServerError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            match name {
                "get_weather" => Ok(ToolOutput::Text("22C, sunny".into())),
                "forecast" => Ok(ToolOutput::Structured(json!({"days": [18, 20]}))),
                _ => Err(ServerError::Rejected("station offline".into())),
            }
        }

        async fn shutdown(&self) -> std::result::Result<(), ServerError> {
            Ok(())
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "c1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn failure_message(result: &ToolCallResult) -> &str {
        match &result.outcome {
            ToolOutcome::Failure { message } => message,
            ToolOutcome::Success { content } => panic!("expected failure, got {content}"),
        }
    }

    #[tokio::test]
    async fn discovery_translates_in_order() {
        let gateway = ToolGateway::discover(FakeServer::weather()).await.unwrap();
        let names: Vec<&str> = gateway.schemas().iter().map(FunctionSchema::name).collect();
        assert_eq!(names, ["get_weather", "forecast", "broken"]);
        assert_eq!(gateway.tools().len(), 3);
    }

    #[tokio::test]
    async fn discovery_rejects_duplicate_names() {
        let mut server = FakeServer::weather();
        server.tools.push(server.tools[0].clone());
        let err = ToolGateway::discover(server).await.unwrap_err();
        assert!(matches!(err, Error::Discovery(ref m) if m.contains("get_weather")));
    }

    #[tokio::test]
    async fn successful_call_returns_text() {
        let gateway = ToolGateway::discover(FakeServer::weather()).await.unwrap();
        let result = gateway
            .invoke(&call("get_weather", r#"{"city":"Paris"}"#))
            .await;
        assert_eq!(result, ToolCallResult::success("c1", "22C, sunny"));

        let calls = gateway.server().calls.lock().unwrap();
        assert_eq!(calls[0].0, "get_weather");
        assert_eq!(calls[0].1["city"], "Paris");
    }

    #[tokio::test]
    async fn structured_output_is_serialized() {
        let gateway = ToolGateway::discover(FakeServer::weather()).await.unwrap();
        let result = gateway.invoke(&call("forecast", "")).await;
        assert_eq!(result, ToolCallResult::success("c1", r#"{"days":[18,20]}"#));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure_outcome() {
        let gateway = ToolGateway::discover(FakeServer::weather()).await.unwrap();
        let result = gateway.invoke(&call("doesNotExist", "{}")).await;
        assert_eq!(failure_message(&result), "tool not found: doesNotExist");
        assert!(gateway.server().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_arguments_never_reach_the_server() {
        let gateway = ToolGateway::discover(FakeServer::weather()).await.unwrap();

        let result = gateway.invoke(&call("get_weather", "{city:")).await;
        assert!(failure_message(&result).starts_with("invalid arguments: not valid JSON"));

        let result = gateway.invoke(&call("get_weather", r#"{"city":75}"#)).await;
        assert_eq!(
            failure_message(&result),
            "invalid arguments: argument `city` should be string, got number"
        );

        let result = gateway.invoke(&call("get_weather", "{}")).await;
        assert_eq!(
            failure_message(&result),
            "invalid arguments: missing required argument(s): city"
        );

        assert!(gateway.server().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_errors_become_failures() {
        let gateway = ToolGateway::discover(FakeServer::weather()).await.unwrap();
        let result = gateway.invoke(&call("broken", "{}")).await;
        assert_eq!(failure_message(&result), "station offline");
        assert_eq!(result.history_content(), "error: station offline");
    }
}
