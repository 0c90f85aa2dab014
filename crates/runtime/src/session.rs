//! Session management.
//!
//! A [`Session`] owns the conversation history and drives one turn per user
//! query: ask the model, run any tool calls it requests in order, then ask the
//! model once more (without tools) for the final answer.

use crate::model::{Backend, History, Message, ModelError, ModelRequest, ModelTurn};
use crate::tools::{ToolGateway, ToolOutcome, ToolServer};
use serde::Serialize;
use serde_json::Value;
use steplog::{Event, EventKind, SessionId, StepStore};
use tracing::{debug, info, instrument, warn};

/// A conversation session bound to one model backend and one tool server.
pub struct Session<B, S> {
    pub id: SessionId,
    backend: B,
    tools: ToolGateway<S>,
    steps: StepStore,
    history: History,
    system: Option<String>,
}

impl<B: Backend, S: ToolServer> Session<B, S> {
    /// Create a session over discovered tools.
    pub fn new(backend: B, tools: ToolGateway<S>, steps: StepStore) -> Self {
        let session = Self {
            id: SessionId::new(),
            backend,
            tools,
            steps,
            history: History::new(),
            system: None,
        };
        session.record(EventKind::SessionStart {
            server: session.tools.server().name().to_string(),
            tools: session.tools.tools().iter().map(|t| t.name.clone()).collect(),
        });
        session
    }

    /// Set the system prompt, sent once at the start of the history.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tools(&self) -> &ToolGateway<S> {
        &self.tools
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Process one user query and return the text to show.
    ///
    /// Failures never escape: they end the turn with a bracketed trace line in
    /// the output and leave the history as it was at that point.
    #[instrument(name = "turn", skip_all, fields(session_id = %self.id))]
    pub async fn chat(&mut self, query: &str) -> String {
        if self.history.is_empty()
            && let Some(system) = &self.system
        {
            self.history.push(Message::system(system.clone()));
        }
        self.history.push(Message::user(query));

        let (content, calls) = match self.query(true).await {
            Err(e) => return format!("[query failed: {e}]"),
            Ok(ModelTurn::TextAnswer { content }) => {
                self.history.push(Message::assistant(content.clone()));
                return content;
            }
            Ok(ModelTurn::ToolCallsRequested { content, calls }) => (content, calls),
        };

        let mut output = Vec::new();
        if let Some(text) = &content {
            output.push(text.clone());
        }
        self.history
            .push(Message::assistant_with_calls(content, calls.clone()));

        for call in &calls {
            output.push(format!(
                "[called tool {} with args {}]",
                call.name,
                render_arguments(&call.arguments)
            ));
            self.record(EventKind::ToolCall {
                call_id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });

            let result = self.tools.invoke(call).await;
            let content = result.history_content();
            self.record(EventKind::ToolResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content: content.clone(),
                is_error: result.is_failure(),
            });
            self.history.push(Message::tool(&call.id, content));

            if let ToolOutcome::Failure { message } = &result.outcome {
                output.push(format!("[tool call failed: {message}]"));
            }
        }

        match self.query(false).await {
            Err(e) => output.push(format!("[follow-up response failed: {e}]")),
            Ok(ModelTurn::TextAnswer { content }) => {
                self.history.push(Message::assistant(content.clone()));
                if !content.is_empty() {
                    output.push(content);
                }
            }
            Ok(ModelTurn::ToolCallsRequested { content, calls }) => {
                if let Some(text) = content {
                    self.history.push(Message::assistant(text.clone()));
                    output.push(text);
                }
                let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                warn!(calls = calls.len(), "follow-up requested more tools; ignoring");
                output.push(format!("[further tool calls ignored: {}]", names.join(", ")));
            }
        }

        output.join("\n")
    }

    /// End the session and stop the tool server.
    pub async fn close(self) {
        self.record(EventKind::SessionEnd);
        info!(
            session_id = %self.id,
            messages = self.history.len(),
            "session closed, discarding history"
        );

        let server = self.tools.into_server();
        if let Err(e) = server.shutdown().await {
            warn!(server = %server.name(), error = %e, "failed to stop tool server");
        }
    }

    async fn query(&self, offer_tools: bool) -> Result<ModelTurn, ModelError> {
        let schemas = self.tools.schemas();
        let tools = (offer_tools && !schemas.is_empty()).then_some(schemas);
        let request = ModelRequest {
            messages: self.history.as_slice(),
            tools,
        };

        if self.steps.is_enabled() {
            self.record(EventKind::ModelRequest {
                messages: snapshot("model_request", request.messages),
                tools: tools.map_or(0, <[_]>::len),
            });
        }
        debug!(
            messages = request.messages.len(),
            offer_tools, "querying model"
        );

        match self.backend.complete(request).await {
            Ok(turn) => {
                if self.steps.is_enabled() {
                    self.record(EventKind::ModelResponse {
                        response: snapshot("model_response", &turn),
                    });
                }
                Ok(turn)
            }
            Err(e) => {
                warn!(error = %e, "model call failed");
                self.record(EventKind::ModelError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn record(&self, kind: EventKind) {
        let step = kind.name();
        if let Err(e) = self.steps.append(&Event::new(self.id, kind)) {
            warn!(step, error = %e, "failed to write step trace");
        }
    }
}

/// JSON form of a step payload; `null` (with a warning) when it can't be encoded.
fn snapshot<T: Serialize + ?Sized>(step: &'static str, payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        warn!(step, error = %e, "failed to encode step payload");
        Value::Null
    })
}

/// Compact JSON when the text parses, the raw text otherwise.
fn render_arguments(arguments: &str) -> String {
    if arguments.trim().is_empty() {
        return "{}".to_string();
    }
    match serde_json::from_str::<Value>(arguments) {
        Ok(value) => value.to_string(),
        Err(_) => arguments.to_string(),
    }
}
